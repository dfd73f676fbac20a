use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;

use crate::db::entities::{ingredient, tag};
use crate::db::services::{ingredient_service, tag_service};

/// API shape shared by tags and ingredients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedItem {
    pub id: i32,
    pub name: String,
}

impl From<tag::Model> for NamedItem {
    fn from(model: tag::Model) -> Self {
        Self { id: model.id, name: model.name }
    }
}

impl From<ingredient::Model> for NamedItem {
    fn from(model: ingredient::Model) -> Self {
        Self { id: model.id, name: model.name }
    }
}

/// Owner-scoped storage for the simple name-only reference data attached to
/// recipes. Tags and ingredients behave identically over HTTP, so a single
/// router is written against this trait.
#[async_trait]
pub trait ReferenceStore: Clone + Send + Sync + 'static {
    /// Singular, human-readable name used in error messages and logs.
    fn label(&self) -> &'static str;

    async fn list(
        &self,
        db: &DatabaseConnection,
        user_id: i32,
        assigned_only: bool,
    ) -> Result<Vec<NamedItem>, DbErr>;

    async fn create(&self, db: &DatabaseConnection, user_id: i32, name: &str) -> Result<NamedItem, DbErr>;

    async fn get(&self, db: &DatabaseConnection, id: i32, user_id: i32) -> Result<Option<NamedItem>, DbErr>;

    async fn rename(
        &self,
        db: &DatabaseConnection,
        id: i32,
        user_id: i32,
        name: &str,
    ) -> Result<Option<NamedItem>, DbErr>;

    async fn delete(&self, db: &DatabaseConnection, id: i32, user_id: i32) -> Result<u64, DbErr>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TagStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct IngredientStore;

#[async_trait]
impl ReferenceStore for TagStore {
    fn label(&self) -> &'static str {
        "tag"
    }

    async fn list(
        &self,
        db: &DatabaseConnection,
        user_id: i32,
        assigned_only: bool,
    ) -> Result<Vec<NamedItem>, DbErr> {
        let tags = tag_service::get_tags_by_user_id(db, user_id, assigned_only).await?;
        Ok(tags.into_iter().map(NamedItem::from).collect())
    }

    async fn create(&self, db: &DatabaseConnection, user_id: i32, name: &str) -> Result<NamedItem, DbErr> {
        tag_service::create_tag(db, user_id, name).await.map(NamedItem::from)
    }

    async fn get(&self, db: &DatabaseConnection, id: i32, user_id: i32) -> Result<Option<NamedItem>, DbErr> {
        Ok(tag_service::get_tag(db, id, user_id).await?.map(NamedItem::from))
    }

    async fn rename(
        &self,
        db: &DatabaseConnection,
        id: i32,
        user_id: i32,
        name: &str,
    ) -> Result<Option<NamedItem>, DbErr> {
        Ok(tag_service::update_tag(db, id, user_id, name)
            .await?
            .map(NamedItem::from))
    }

    async fn delete(&self, db: &DatabaseConnection, id: i32, user_id: i32) -> Result<u64, DbErr> {
        tag_service::delete_tag(db, id, user_id).await
    }
}

#[async_trait]
impl ReferenceStore for IngredientStore {
    fn label(&self) -> &'static str {
        "ingredient"
    }

    async fn list(
        &self,
        db: &DatabaseConnection,
        user_id: i32,
        assigned_only: bool,
    ) -> Result<Vec<NamedItem>, DbErr> {
        let ingredients =
            ingredient_service::get_ingredients_by_user_id(db, user_id, assigned_only).await?;
        Ok(ingredients.into_iter().map(NamedItem::from).collect())
    }

    async fn create(&self, db: &DatabaseConnection, user_id: i32, name: &str) -> Result<NamedItem, DbErr> {
        ingredient_service::create_ingredient(db, user_id, name)
            .await
            .map(NamedItem::from)
    }

    async fn get(&self, db: &DatabaseConnection, id: i32, user_id: i32) -> Result<Option<NamedItem>, DbErr> {
        Ok(ingredient_service::get_ingredient(db, id, user_id)
            .await?
            .map(NamedItem::from))
    }

    async fn rename(
        &self,
        db: &DatabaseConnection,
        id: i32,
        user_id: i32,
        name: &str,
    ) -> Result<Option<NamedItem>, DbErr> {
        Ok(ingredient_service::update_ingredient(db, id, user_id, name)
            .await?
            .map(NamedItem::from))
    }

    async fn delete(&self, db: &DatabaseConnection, id: i32, user_id: i32) -> Result<u64, DbErr> {
        ingredient_service::delete_ingredient(db, id, user_id).await
    }
}
