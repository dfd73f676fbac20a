use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get},
};
use std::sync::Arc;
use tracing::info;

use crate::db::services::{
    RecipeFilter, UserChanges, ingredient_service, recipe_service, tag_service, user_service,
};
use crate::services::auth_service;
use crate::web::models::admin_models::{
    AdminCreateUserRequest, AdminNamedItemResponse, AdminRecipeResponse, AdminUpdateUserRequest,
    AdminUserResponse,
};
use crate::web::routes::recipe_routes::remove_stored_image;
use crate::web::extract::{AppJson, AppPath};
use crate::web::{AppError, AppState};

/// Staff-only management endpoints. Callers must layer authentication and
/// the staff check on top.
pub fn create_admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(index_handler))
        .route("/admin/users", get(list_users_handler).post(create_user_handler))
        .route(
            "/admin/users/{id}",
            get(get_user_handler)
                .patch(update_user_handler)
                .delete(delete_user_handler),
        )
        .route("/admin/tags", get(list_tags_handler))
        .route("/admin/tags/{id}", delete(delete_tag_handler))
        .route("/admin/ingredients", get(list_ingredients_handler))
        .route("/admin/ingredients/{id}", delete(delete_ingredient_handler))
        .route("/admin/recipes", get(list_recipes_handler))
        .route("/admin/recipes/{id}", delete(delete_recipe_handler))
}

fn not_found(kind: &str) -> AppError {
    AppError::NotFound(format!("{kind} not found"))
}

async fn index_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "users": "/admin/users",
        "tags": "/admin/tags",
        "ingredients": "/admin/ingredients",
        "recipes": "/admin/recipes",
    }))
}

// --- Users ---

async fn list_users_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminUserResponse>>, AppError> {
    let users = user_service::list_users(&app_state.db_pool).await?;
    Ok(Json(users.into_iter().map(AdminUserResponse::from).collect()))
}

async fn create_user_handler(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<AdminCreateUserRequest>,
) -> Result<(StatusCode, Json<AdminUserResponse>), AppError> {
    let user_model = auth_service::create_account(
        &app_state.db_pool,
        &payload.email,
        &payload.password,
        &payload.name,
        (payload.is_active, payload.is_staff, payload.is_superuser),
        app_state.config.bcrypt_cost,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(AdminUserResponse::from(user_model))))
}

async fn get_user_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<AdminUserResponse>, AppError> {
    user_service::get_user_by_id(&app_state.db_pool, id)
        .await?
        .map(|user_model| Json(AdminUserResponse::from(user_model)))
        .ok_or_else(|| not_found("User"))
}

async fn update_user_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<AdminUpdateUserRequest>,
) -> Result<Json<AdminUserResponse>, AppError> {
    let changes = UserChanges {
        email: payload.email,
        name: payload.name.map(|name| name.trim().to_string()),
        password_hash: None,
        is_active: payload.is_active,
        is_staff: payload.is_staff,
        is_superuser: payload.is_superuser,
    };
    let user_model = auth_service::admin_update_user(
        &app_state.db_pool,
        id,
        changes,
        payload.password,
        app_state.config.bcrypt_cost,
    )
    .await?;
    Ok(Json(AdminUserResponse::from(user_model)))
}

async fn delete_user_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    if user_service::get_user_by_id(&app_state.db_pool, id).await?.is_none() {
        return Err(not_found("User"));
    }
    // Owned recipes go first so their stored images can be cleaned up.
    let owned =
        recipe_service::get_recipes_by_user_id(&app_state.db_pool, id, &RecipeFilter::default()).await?;
    for record in owned {
        if let Some(deleted) = recipe_service::delete_recipe_as_admin(&app_state.db_pool, record.recipe.id).await? {
            if let Some(image) = deleted.image.as_deref() {
                remove_stored_image(app_state.media_storage.as_ref(), image).await;
            }
        }
    }
    user_service::delete_user(&app_state.db_pool, id).await?;
    info!(user_id = id, "User deleted from the admin console.");
    Ok(StatusCode::NO_CONTENT)
}

// --- Reference data and recipes ---

async fn list_tags_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminNamedItemResponse>>, AppError> {
    let tags = tag_service::list_all_tags(&app_state.db_pool).await?;
    Ok(Json(tags.into_iter().map(AdminNamedItemResponse::from).collect()))
}

async fn delete_tag_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    if tag_service::delete_tag_as_admin(&app_state.db_pool, id).await? == 0 {
        return Err(not_found("Tag"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_ingredients_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminNamedItemResponse>>, AppError> {
    let ingredients = ingredient_service::list_all_ingredients(&app_state.db_pool).await?;
    Ok(Json(ingredients.into_iter().map(AdminNamedItemResponse::from).collect()))
}

async fn delete_ingredient_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    if ingredient_service::delete_ingredient_as_admin(&app_state.db_pool, id).await? == 0 {
        return Err(not_found("Ingredient"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_recipes_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminRecipeResponse>>, AppError> {
    let records = recipe_service::list_all_recipes(&app_state.db_pool).await?;
    Ok(Json(records.into_iter().map(AdminRecipeResponse::from).collect()))
}

async fn delete_recipe_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    let deleted = recipe_service::delete_recipe_as_admin(&app_state.db_pool, id)
        .await?
        .ok_or_else(|| not_found("Recipe"))?;
    if let Some(image) = deleted.image.as_deref() {
        remove_stored_image(app_state.media_storage.as_ref(), image).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::web::test_support::TestApp;

    #[tokio::test]
    async fn test_admin_requires_staff() {
        let app = TestApp::new().await;
        let (status, _) = app.request(Method::GET, "/admin/users", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let user = app.create_user("user@example.com", "testpass").await;
        let token = app.token_for(&user);
        let (status, _) = app.request(Method::GET, "/admin/users", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_users_listed() {
        let app = TestApp::new().await;
        let admin = app.create_staff("admin@example.com", "password123").await;
        app.create_user("user@example.com", "password123").await;
        let token = app.token_for(&admin);

        let (status, body) = app.request(Method::GET, "/admin/users/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let emails: Vec<_> = body.as_array().unwrap().iter().map(|u| u["email"].clone()).collect();
        assert_eq!(emails, vec![json!("admin@example.com"), json!("user@example.com")]);
        assert!(body[0].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_create_and_edit_user() {
        let app = TestApp::new().await;
        let admin = app.create_staff("admin@example.com", "password123").await;
        let token = app.token_for(&admin);

        let (status, body) = app
            .request(
                Method::POST,
                "/admin/users",
                Some(&token),
                Some(json!({"email": "user@example.com", "password": "password123", "name": "User"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["is_active"], true);
        assert_eq!(body["is_staff"], false);

        let uri = format!("/admin/users/{}", body["id"]);
        let (status, body) = app
            .request(Method::PATCH, &uri, Some(&token), Some(json!({"name": "Renamed", "is_staff": true})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Renamed");
        assert_eq!(body["is_staff"], true);

        let (status, _) = app.request(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let app = TestApp::new().await;
        let admin = app.create_staff("admin@example.com", "password123").await;
        let user = app.create_user("user@example.com", "password123").await;
        let token = app.token_for(&admin);
        let tag = app.create_tag(user.id, "Vegan").await;
        app.create_recipe(user.id, "Salad", &[tag.id], &[]).await;

        let (status, _) = app
            .request(Method::DELETE, &format!("/admin/users/{}", user.id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = app.request(Method::GET, "/admin/recipes", Some(&token), None).await;
        assert_eq!(body, json!([]));
        let (_, body) = app.request(Method::GET, "/admin/tags", Some(&token), None).await;
        assert_eq!(body, json!([]));

        let (status, _) = app
            .request(Method::DELETE, &format!("/admin/users/{}", user.id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_foreign_records() {
        let app = TestApp::new().await;
        let admin = app.create_staff("admin@example.com", "password123").await;
        let user = app.create_user("user@example.com", "password123").await;
        let token = app.token_for(&admin);
        let ingredient = app.create_ingredient(user.id, "Salt").await;
        let record = app.create_recipe(user.id, "Soup", &[], &[ingredient.id]).await;

        let (_, body) = app.request(Method::GET, "/admin/recipes", Some(&token), None).await;
        assert_eq!(body[0]["user_id"], user.id);
        assert_eq!(body[0]["ingredients"], json!([ingredient.id]));

        let (status, _) = app
            .request(Method::DELETE, &format!("/admin/ingredients/{}", ingredient.id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app
            .request(Method::DELETE, &format!("/admin/recipes/{}", record.recipe.id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app
            .request(Method::DELETE, &format!("/admin/recipes/{}", record.recipe.id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
