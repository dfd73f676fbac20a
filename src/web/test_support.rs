//! In-process harness for the HTTP tests: an in-memory SQLite database, a
//! throwaway media directory and the fully layered router.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

use crate::db;
use crate::db::entities::{ingredient, tag, user};
use crate::db::services::{
    NewRecipe, RecipeRecord, ingredient_service, recipe_service, tag_service,
};
use crate::server::config::ServerConfig;
use crate::services::{auth_service, media_storage::FileSystemStorage};
use crate::web::create_axum_router;

const TEST_SECRET: &str = "test-secret";
const TEST_BCRYPT_COST: u32 = 4;
const BOUNDARY: &str = "recipe-test-boundary";

pub(crate) struct TestApp {
    pub db: DatabaseConnection,
    router: NormalizePath<axum::Router>,
    media_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = db::connect("sqlite::memory:").await.unwrap();
        let media_dir = TempDir::new().unwrap();
        let config = Arc::new(ServerConfig {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: TEST_SECRET.to_string(),
            listen_addr: "127.0.0.1:0".to_string(),
            media_root: media_dir.path().to_string_lossy().into_owned(),
            media_url: "/media".to_string(),
            log_dir: media_dir.path().to_string_lossy().into_owned(),
            max_upload_bytes: 1024 * 1024,
            bcrypt_cost: TEST_BCRYPT_COST,
        });
        let storage = Arc::new(FileSystemStorage::new(media_dir.path(), &config.media_url));
        let router = create_axum_router(db.clone(), storage, config);
        Self { db, router, media_dir }
    }

    pub async fn create_user(&self, email: &str, password: &str) -> user::Model {
        auth_service::create_account(&self.db, email, password, "Test name", (true, false, false), TEST_BCRYPT_COST)
            .await
            .unwrap()
    }

    pub async fn create_staff(&self, email: &str, password: &str) -> user::Model {
        auth_service::create_superuser(&self.db, email, password, "Admin", TEST_BCRYPT_COST)
            .await
            .unwrap()
    }

    pub fn token_for(&self, user: &user::Model) -> String {
        auth_service::create_jwt_for_user(user, TEST_SECRET).unwrap()
    }

    pub async fn create_tag(&self, user_id: i32, name: &str) -> tag::Model {
        tag_service::create_tag(&self.db, user_id, name).await.unwrap()
    }

    pub async fn create_ingredient(&self, user_id: i32, name: &str) -> ingredient::Model {
        ingredient_service::create_ingredient(&self.db, user_id, name).await.unwrap()
    }

    /// A 10 minute, 5.00 recipe with the given links.
    pub async fn create_recipe(
        &self,
        user_id: i32,
        title: &str,
        tag_ids: &[i32],
        ingredient_ids: &[i32],
    ) -> RecipeRecord {
        let new_recipe = NewRecipe {
            title: title.to_string(),
            time_minutes: 10,
            price_cents: 500,
            link: String::new(),
            tag_ids: tag_ids.to_vec(),
            ingredient_ids: ingredient_ids.to_vec(),
        };
        recipe_service::create_recipe(&self.db, user_id, new_recipe).await.unwrap()
    }

    pub fn media_path(&self, relative_path: &str) -> PathBuf {
        self.media_dir.path().join(relative_path)
    }

    /// Sends a JSON request and returns the status with the decoded body
    /// (`Value::Null` for an empty or non-JSON body).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        self.send(request).await
    }

    /// Posts a single-file multipart form.
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        filename: &str,
        bytes: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Sends a prebuilt request, for bodies the JSON helper cannot produce.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}
