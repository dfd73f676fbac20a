use axum::{ServiceExt, extract::Request};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};

use recipe_api::db;
use recipe_api::server::config::ServerConfig;
use recipe_api::server::logging::init_logging;
use recipe_api::services::auth_service;
use recipe_api::services::media_storage::FileSystemStorage;
use recipe_api::web::create_axum_router;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a staff account with full admin rights, then exit
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        name: String,
    },
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for the shutdown signal.");
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // --- Server Config Setup ---
    let server_config = Arc::new(ServerConfig::load(args.config.as_deref())?);

    let _log_guard = init_logging(&server_config.log_dir);
    info!("Starting recipe server, version: {}", env!("CARGO_PKG_VERSION"));

    // --- Database Pool Setup ---
    let db_pool = match db::connect(&server_config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to connect to the database.");
            return Err(e.into());
        }
    };

    if let Some(Command::CreateSuperuser { email, password, name }) = args.command {
        let user = auth_service::create_superuser(
            &db_pool,
            &email,
            &password,
            &name,
            server_config.bcrypt_cost,
        )
        .await?;
        info!(user_id = user.id, email = %user.email, "Superuser created.");
        return Ok(());
    }

    let media_storage = Arc::new(FileSystemStorage::new(
        &server_config.media_root,
        &server_config.media_url,
    ));
    let app = create_axum_router(db_pool, media_storage, server_config.clone());

    let listener = tokio::net::TcpListener::bind(&server_config.listen_addr).await?;
    info!("HTTP server listening on {}", server_config.listen_addr);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
