use axum::{
    Json, Router,
    extract::{Extension, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::db::services::{NamedItem, ReferenceStore};
use crate::web::models::{AuthenticatedUser, NamedItemRequest};
use crate::web::extract::{AppJson, AppPath, AppQuery};
use crate::web::{AppError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub assigned_only: Option<String>,
}

/// `assigned_only` is an integer flag: `1` limits the list to items used by
/// at least one recipe, `0` or absence lists everything.
pub fn parse_assigned_only(raw: Option<&str>) -> Result<bool, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(false),
        Some(value) => value
            .parse::<i64>()
            .map(|flag| flag != 0)
            .map_err(|_| AppError::InvalidInput("assigned_only: A valid integer is required.".to_string())),
    }
}

/// CRUD routes for one kind of owner-scoped reference data under `base`.
pub fn create_reference_router<S: ReferenceStore>(base: &str, store: S) -> Router<Arc<AppState>> {
    Router::new()
        .route(base, get(list_handler::<S>).post(create_handler::<S>))
        .route(
            &format!("{base}/{{id}}"),
            get(get_handler::<S>)
                .put(update_handler::<S>)
                .patch(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .layer(Extension(store))
}

fn not_found<S: ReferenceStore>(store: &S) -> AppError {
    AppError::NotFound(format!("No {} matches the given query.", store.label()))
}

async fn list_handler<S: ReferenceStore>(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    Extension(store): Extension<S>,
    State(app_state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<NamedItem>>, AppError> {
    let assigned_only = parse_assigned_only(params.assigned_only.as_deref())?;
    let items = store
        .list(&app_state.db_pool, authenticated_user.id, assigned_only)
        .await?;
    Ok(Json(items))
}

async fn create_handler<S: ReferenceStore>(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    Extension(store): Extension<S>,
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<NamedItemRequest>,
) -> Result<(StatusCode, Json<NamedItem>), AppError> {
    let name = payload.validated_name()?;
    let item = store.create(&app_state.db_pool, authenticated_user.id, &name).await?;
    debug!(kind = store.label(), id = item.id, user_id = authenticated_user.id, "Created.");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_handler<S: ReferenceStore>(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    Extension(store): Extension<S>,
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<NamedItem>, AppError> {
    store
        .get(&app_state.db_pool, id, authenticated_user.id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&store))
}

async fn update_handler<S: ReferenceStore>(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    Extension(store): Extension<S>,
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<NamedItemRequest>,
) -> Result<Json<NamedItem>, AppError> {
    let name = payload.validated_name()?;
    store
        .rename(&app_state.db_pool, id, authenticated_user.id, &name)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&store))
}

async fn delete_handler<S: ReferenceStore>(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    Extension(store): Extension<S>,
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    let rows_affected = store.delete(&app_state.db_pool, id, authenticated_user.id).await?;
    if rows_affected == 0 {
        return Err(not_found(&store));
    }
    Ok(StatusCode::NO_CONTENT)
}
