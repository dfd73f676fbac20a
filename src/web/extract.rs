//! Request extractors whose rejections go through [`AppError`], so a malformed
//! body, path or query string gets the same `{"error": ...}` response as any
//! other validation failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::web::error::AppError;

/// JSON body. Syntax errors, type mismatches and a missing
/// `Content-Type: application/json` all become 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path parameters. An id that does not parse cannot name a record, so it is a 404.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
