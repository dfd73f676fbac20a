use axum::{
    Json, Router,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

use crate::db::services::user_service;
use crate::services::auth_service;
use crate::web::middleware::auth::TOKEN_COOKIE;
use crate::web::models::{
    AuthenticatedUser, CreateUserRequest, TokenRequest, UpdateUserRequest, UserResponse,
};
use crate::web::extract::AppJson;
use crate::web::{AppError, AppState};

/// Registration and token exchange; reachable without credentials.
pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user/create", post(create_user_handler))
        .route("/api/user/token", post(create_token_handler))
}

/// The caller's own profile.
pub fn create_profile_router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/user/me",
        get(get_me_handler).put(update_me_handler).patch(update_me_handler),
    )
}

async fn create_user_handler(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user_model =
        auth_service::register_user(&app_state.db_pool, payload, app_state.config.bcrypt_cost).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            email: user_model.email,
            name: user_model.name,
        }),
    ))
}

async fn create_token_handler(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token_response =
        auth_service::issue_token(&app_state.db_pool, payload, &app_state.config.jwt_secret).await?;

    let auth_cookie = Cookie::build((TOKEN_COOKIE, token_response.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();

    Ok((jar.add(auth_cookie), Json(token_response)))
}

async fn get_me_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<UserResponse>, AppError> {
    let user_model = user_service::get_user_by_id(&app_state.db_pool, authenticated_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(UserResponse {
        email: user_model.email,
        name: user_model.name,
    }))
}

// PUT and PATCH behave the same: every field of the profile is optional.
async fn update_me_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user_model = auth_service::update_profile(
        &app_state.db_pool,
        authenticated_user.id,
        payload,
        app_state.config.bcrypt_cost,
    )
    .await?;
    Ok(Json(UserResponse {
        email: user_model.email,
        name: user_model.name,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::web::test_support::TestApp;

    #[tokio::test]
    async fn test_create_valid_user_success() {
        let app = TestApp::new().await;
        let (status, body) = app
            .request(
                Method::POST,
                "/api/user/create/",
                None,
                Some(json!({"email": "test@example.com", "password": "testpass", "name": "Test name"})),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"email": "test@example.com", "name": "Test name"}));
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn test_user_exists() {
        let app = TestApp::new().await;
        app.create_user("test@example.com", "testpass").await;

        let (status, _) = app
            .request(
                Method::POST,
                "/api/user/create",
                None,
                Some(json!({"email": "test@example.com", "password": "testpass", "name": "Test"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_password_too_short() {
        let app = TestApp::new().await;
        let (status, _) = app
            .request(
                Method::POST,
                "/api/user/create",
                None,
                Some(json!({"email": "test@example.com", "password": "pw", "name": "Test"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .request(Method::POST, "/api/user/token", None, Some(json!({"email": "test@example.com", "password": "pw"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_token_for_user() {
        let app = TestApp::new().await;
        app.create_user("test@example.com", "testpass").await;

        let (status, body) = app
            .request(
                Method::POST,
                "/api/user/token",
                None,
                Some(json!({"email": "test@example.com", "password": "testpass"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn test_create_token_rejected() {
        let app = TestApp::new().await;
        app.create_user("test@example.com", "testpass").await;

        for payload in [
            json!({"email": "test@example.com", "password": "wrong"}),
            json!({"email": "nobody@example.com", "password": "testpass"}),
            json!({"email": "test@example.com", "password": ""}),
        ] {
            let (status, body) = app.request(Method::POST, "/api/user/token", None, Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body.get("token").is_none());
        }
    }

    #[tokio::test]
    async fn test_retrieve_user_unauthorized() {
        let app = TestApp::new().await;
        let (status, _) = app.request(Method::GET, "/api/user/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_retrieve_profile_success() {
        let app = TestApp::new().await;
        let user = app.create_user("test@example.com", "testpass").await;
        let token = app.token_for(&user);

        let (status, body) = app.request(Method::GET, "/api/user/me/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"email": "test@example.com", "name": "Test name"}));
    }

    #[tokio::test]
    async fn test_post_me_not_allowed() {
        let app = TestApp::new().await;
        let user = app.create_user("test@example.com", "testpass").await;
        let token = app.token_for(&user);

        let (status, _) = app.request(Method::POST, "/api/user/me", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_update_user_profile() {
        let app = TestApp::new().await;
        let user = app.create_user("test@example.com", "testpass").await;
        let token = app.token_for(&user);

        let (status, body) = app
            .request(
                Method::PATCH,
                "/api/user/me",
                Some(&token),
                Some(json!({"name": "new name", "password": "newpassword123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "new name");

        let (status, _) = app
            .request(
                Method::POST,
                "/api/user/token",
                None,
                Some(json!({"email": "test@example.com", "password": "newpassword123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}
