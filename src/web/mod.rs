use axum::{
    Json, Router,
    http::Method,
    middleware as axum_middleware,
    routing::get,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::db::services::{IngredientStore, TagStore};
use crate::server::config::ServerConfig;
use crate::services::media_storage::MediaStorage;
use crate::web::{
    middleware::auth,
    routes::*,
};

pub use crate::web::error::AppError;

pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;

#[cfg(test)]
pub(crate) mod test_support;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub media_storage: Arc<dyn MediaStorage>,
    pub config: Arc<ServerConfig>,
}

async fn health_check_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Builds the full application. Routes are declared without a trailing slash
/// and the outer layer strips one from incoming paths, so `/api/recipe/tags/`
/// and `/api/recipe/tags` are the same endpoint.
pub fn create_axum_router(
    db_pool: DatabaseConnection,
    media_storage: Arc<dyn MediaStorage>,
    config: Arc<ServerConfig>,
) -> NormalizePath<Router> {
    let app_state = Arc::new(AppState {
        db_pool,
        media_storage,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let protected = Router::new()
        .merge(user_routes::create_profile_router())
        .merge(reference_routes::create_reference_router("/api/recipe/tags", TagStore))
        .merge(reference_routes::create_reference_router(
            "/api/recipe/ingredients",
            IngredientStore,
        ))
        .merge(recipe_routes::create_recipe_router(config.max_upload_bytes))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth));

    let admin = admin_routes::create_admin_router()
        .route_layer(axum_middleware::from_fn(auth::require_staff))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth));

    let router = Router::new()
        .route("/api/health", get(health_check_handler))
        .merge(user_routes::create_public_router())
        .merge(protected)
        .merge(admin)
        .nest_service(&config.media_url, ServeDir::new(&config.media_root))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
