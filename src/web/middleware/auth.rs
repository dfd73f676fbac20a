use axum::{
    body::Body as AxumBody,
    extract::{Extension, State},
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::warn;

use crate::db::services::user_service;
use crate::services::auth_service;
use crate::web::models::AuthenticatedUser;
use crate::web::{AppState, error::AppError};

pub const TOKEN_COOKIE: &str = "token";

/// Accepts `Bearer <jwt>` as well as the `Token <jwt>` scheme.
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Token "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    // Try to get token from Authorization header first, then fall back to cookie
    let token = token_from_headers(req.headers())
        .or_else(|| jar.get(TOKEN_COOKIE).map(|c| c.value().to_string()))
        .ok_or(AppError::InvalidCredentials)?;

    let claims = auth_service::decode_jwt(&token, &state.config.jwt_secret)?;

    // The token outlives account changes, so the account is re-checked on every request.
    let user = user_service::get_user_by_id(&state.db_pool, claims.user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| {
            warn!(user_id = claims.user_id, "Token for a missing or inactive user.");
            AppError::InvalidCredentials
        })?;

    let authenticated_user = AuthenticatedUser {
        id: user.id,
        email: user.email,
        is_staff: user.is_staff,
    };
    req.extensions_mut().insert(authenticated_user);
    Ok(next.run(req).await)
}

/// Must run after [`auth`].
pub async fn require_staff(
    Extension(user): Extension<AuthenticatedUser>,
    req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    if !user.is_staff {
        warn!(user_id = user.id, "Non-staff user tried to reach the admin console.");
        return Err(AppError::Forbidden(
            "You do not have permission to perform this action.".to_string(),
        ));
    }
    Ok(next.run(req).await)
}
