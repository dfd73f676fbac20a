use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::entities::{ingredient, tag, user};
use crate::db::services::RecipeRecord;
use crate::web::models::recipe_models::price_from_cents;

#[derive(Debug, Serialize)]
pub struct AdminUserResponse {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<user::Model> for AdminUserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            is_active: model.is_active,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            last_login: model.last_login,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminCreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

/// A tag or ingredient with its owner, as shown across tenants.
#[derive(Debug, Serialize)]
pub struct AdminNamedItemResponse {
    pub id: i32,
    pub name: String,
    pub user_id: i32,
}

impl From<tag::Model> for AdminNamedItemResponse {
    fn from(model: tag::Model) -> Self {
        Self { id: model.id, name: model.name, user_id: model.user_id }
    }
}

impl From<ingredient::Model> for AdminNamedItemResponse {
    fn from(model: ingredient::Model) -> Self {
        Self { id: model.id, name: model.name, user_id: model.user_id }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminRecipeResponse {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
    pub tags: Vec<i32>,
    pub ingredients: Vec<i32>,
}

impl From<RecipeRecord> for AdminRecipeResponse {
    fn from(record: RecipeRecord) -> Self {
        let RecipeRecord { recipe, tag_ids, ingredient_ids } = record;
        Self {
            id: recipe.id,
            user_id: recipe.user_id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: price_from_cents(recipe.price_cents),
            link: recipe.link,
            image: recipe.image,
            tags: tag_ids,
            ingredients: ingredient_ids,
        }
    }
}
