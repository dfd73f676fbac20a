use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Extension, Multipart, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::services::{RecipeFilter, recipe_service};
use crate::services::image_service;
use crate::services::media_storage::MediaStorage;
use crate::web::models::AuthenticatedUser;
use crate::web::models::recipe_models::{
    RecipeDetailResponse, RecipeImageResponse, RecipeRequest, RecipeResponse,
};
use crate::web::extract::{AppJson, AppPath, AppQuery};
use crate::web::{AppError, AppState};

const IMAGE_FIELD: &str = "image";

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListParams {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

impl RecipeListParams {
    pub fn into_filter(self) -> Result<RecipeFilter, AppError> {
        Ok(RecipeFilter {
            tag_ids: parse_id_list("tags", self.tags.as_deref())?,
            ingredient_ids: parse_id_list("ingredients", self.ingredients.as_deref())?,
        })
    }
}

/// Parses a comma separated id list such as `"1,2,3"`. A missing or blank
/// parameter means "no filter".
pub fn parse_id_list(field: &str, raw: Option<&str>) -> Result<Option<Vec<i32>>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.split(',')
        .map(|part| {
            part.trim().parse::<i32>().map_err(|_| {
                AppError::InvalidInput(format!("{field}: '{}' is not a valid id.", part.trim()))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

pub fn create_recipe_router(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/recipe/recipes",
            get(list_recipes_handler).post(create_recipe_handler),
        )
        .route(
            "/api/recipe/recipes/{id}",
            get(get_recipe_handler)
                .put(replace_recipe_handler)
                .patch(patch_recipe_handler)
                .delete(delete_recipe_handler),
        )
        .route(
            "/api/recipe/recipes/{id}/upload-image",
            post(upload_image_handler).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

fn recipe_not_found() -> AppError {
    AppError::NotFound("No recipe matches the given query.".to_string())
}

async fn list_recipes_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<RecipeListParams>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let filter = params.into_filter()?;
    let records =
        recipe_service::get_recipes_by_user_id(&app_state.db_pool, authenticated_user.id, &filter)
            .await?;
    Ok(Json(records.into_iter().map(RecipeResponse::from).collect()))
}

async fn create_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), AppError> {
    let new_recipe = payload.into_new_recipe()?;
    let record =
        recipe_service::create_recipe(&app_state.db_pool, authenticated_user.id, new_recipe).await?;
    Ok((StatusCode::CREATED, Json(RecipeResponse::from(record))))
}

async fn get_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<RecipeDetailResponse>, AppError> {
    let detail = recipe_service::get_recipe_detail(&app_state.db_pool, id, authenticated_user.id)
        .await?
        .ok_or_else(recipe_not_found)?;
    Ok(Json(RecipeDetailResponse::new(
        detail,
        app_state.media_storage.as_ref(),
    )))
}

async fn update_recipe(
    app_state: &AppState,
    user_id: i32,
    recipe_id: i32,
    payload: RecipeRequest,
    partial: bool,
) -> Result<Json<RecipeResponse>, AppError> {
    let changes = payload.into_changes(partial)?;
    let record = recipe_service::update_recipe(&app_state.db_pool, recipe_id, user_id, changes)
        .await?
        .ok_or_else(recipe_not_found)?;
    Ok(Json(RecipeResponse::from(record)))
}

async fn replace_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    update_recipe(&app_state, authenticated_user.id, id, payload, false).await
}

async fn patch_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    update_recipe(&app_state, authenticated_user.id, id, payload, true).await
}

async fn delete_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    let deleted = recipe_service::delete_recipe(&app_state.db_pool, id, authenticated_user.id)
        .await?
        .ok_or_else(recipe_not_found)?;
    if let Some(image) = deleted.image.as_deref() {
        remove_stored_image(app_state.media_storage.as_ref(), image).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Failing to remove a stale file must not fail the request that replaced it.
pub(crate) async fn remove_stored_image(storage: &dyn MediaStorage, path: &str) {
    if let Err(e) = storage.delete(path).await {
        warn!(path, error = %e, "Failed to remove stored image.");
    }
}

async fn upload_image_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
    mut multipart: Multipart,
) -> Result<Json<RecipeImageResponse>, AppError> {
    let recipe_model = recipe_service::get_recipe(&app_state.db_pool, id, authenticated_user.id)
        .await?
        .ok_or_else(recipe_not_found)?;

    let mut image_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("image: {}", e.body_text())))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("image: {}", e.body_text())))?;
            image_bytes = Some(bytes);
            break;
        }
    }
    let image_bytes = image_bytes
        .ok_or_else(|| AppError::InvalidInput("image: No file was submitted.".to_string()))?;

    let format = image_service::validate_image(&image_bytes)?;
    let image_path = image_service::recipe_image_path(format);
    let storage = app_state.media_storage.as_ref();
    storage.save(&image_path, &image_bytes).await?;

    let previous_image = recipe_model.image.clone();
    let updated = match recipe_service::set_recipe_image(&app_state.db_pool, recipe_model, &image_path).await {
        Ok(updated) => updated,
        Err(e) => {
            remove_stored_image(storage, &image_path).await;
            return Err(e.into());
        }
    };
    if let Some(previous) = previous_image.as_deref() {
        remove_stored_image(storage, previous).await;
    }

    info!(recipe_id = updated.id, path = %image_path, "Recipe image uploaded.");
    Ok(Json(RecipeImageResponse::new(&updated, storage)))
}
