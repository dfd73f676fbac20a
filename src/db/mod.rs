pub mod entities;
pub mod schema;
pub mod services;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Opens the connection pool and makes sure the schema exists.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    if database_url.starts_with("sqlite::memory:") {
        // Every SQLite in-memory connection is a separate database.
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(10);
    }
    opt.sqlx_logging(false);

    let db = Database::connect(opt).await?;
    schema::create_tables(&db).await?;
    Ok(db)
}
