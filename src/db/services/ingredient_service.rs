use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};

use crate::db::entities::ingredient;
use crate::db::services::owned_query;

// --- Ingredient Service Functions ---

/// Creates a new ingredient for a user.
pub async fn create_ingredient<C: ConnectionTrait>(db: &C, user_id: i32, name: &str) -> Result<ingredient::Model, DbErr> {
    ingredient::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Retrieves the user's ingredients, name descending.
pub async fn get_ingredients_by_user_id<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    assigned_only: bool,
) -> Result<Vec<ingredient::Model>, DbErr> {
    owned_query::list_owned::<ingredient::Entity, _>(db, user_id, assigned_only).await
}

/// Retrieves a single ingredient if it belongs to the user.
pub async fn get_ingredient<C: ConnectionTrait>(db: &C, ingredient_id: i32, user_id: i32) -> Result<Option<ingredient::Model>, DbErr> {
    owned_query::find_owned::<ingredient::Entity, _>(db, ingredient_id, user_id).await
}

/// Renames an ingredient. Returns `None` if it does not exist or belongs to someone else.
pub async fn update_ingredient<C: ConnectionTrait>(
    db: &C,
    ingredient_id: i32,
    user_id: i32,
    name: &str,
) -> Result<Option<ingredient::Model>, DbErr> {
    let Some(existing) = get_ingredient(db, ingredient_id, user_id).await? else {
        return Ok(None);
    };
    let mut active: ingredient::ActiveModel = existing.into();
    active.name = Set(name.to_string());
    active.update(db).await.map(Some)
}

/// Deletes an ingredient along with its recipe_ingredients rows.
pub async fn delete_ingredient<C: ConnectionTrait>(db: &C, ingredient_id: i32, user_id: i32) -> Result<u64, DbErr> {
    owned_query::delete_owned::<ingredient::Entity, _>(db, ingredient_id, user_id).await
}

/// Every ingredient across all users, for the admin console.
pub async fn list_all_ingredients<C: ConnectionTrait>(db: &C) -> Result<Vec<ingredient::Model>, DbErr> {
    owned_query::list_all::<ingredient::Entity, _>(db).await
}

/// Deletes any ingredient regardless of owner.
pub async fn delete_ingredient_as_admin<C: ConnectionTrait>(db: &C, ingredient_id: i32) -> Result<u64, DbErr> {
    owned_query::delete_any::<ingredient::Entity, _>(db, ingredient_id).await
}
