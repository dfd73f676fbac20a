use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};

use crate::db::entities::tag;
use crate::db::services::owned_query;

// --- Tag Service Functions ---

/// Creates a new tag for a user.
pub async fn create_tag<C: ConnectionTrait>(db: &C, user_id: i32, name: &str) -> Result<tag::Model, DbErr> {
    tag::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Retrieves the user's tags, name descending.
pub async fn get_tags_by_user_id<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    assigned_only: bool,
) -> Result<Vec<tag::Model>, DbErr> {
    owned_query::list_owned::<tag::Entity, _>(db, user_id, assigned_only).await
}

/// Retrieves a single tag if it belongs to the user.
pub async fn get_tag<C: ConnectionTrait>(db: &C, tag_id: i32, user_id: i32) -> Result<Option<tag::Model>, DbErr> {
    owned_query::find_owned::<tag::Entity, _>(db, tag_id, user_id).await
}

/// Renames a tag. Returns `None` if it does not exist or belongs to someone else.
pub async fn update_tag<C: ConnectionTrait>(
    db: &C,
    tag_id: i32,
    user_id: i32,
    name: &str,
) -> Result<Option<tag::Model>, DbErr> {
    let Some(existing) = get_tag(db, tag_id, user_id).await? else {
        return Ok(None);
    };
    let mut active: tag::ActiveModel = existing.into();
    active.name = Set(name.to_string());
    active.update(db).await.map(Some)
}

/// Deletes a tag along with its recipe_tags rows.
pub async fn delete_tag<C: ConnectionTrait>(db: &C, tag_id: i32, user_id: i32) -> Result<u64, DbErr> {
    owned_query::delete_owned::<tag::Entity, _>(db, tag_id, user_id).await
}

/// Every tag across all users, for the admin console.
pub async fn list_all_tags<C: ConnectionTrait>(db: &C) -> Result<Vec<tag::Model>, DbErr> {
    owned_query::list_all::<tag::Entity, _>(db).await
}

/// Deletes any tag regardless of owner.
pub async fn delete_tag_as_admin<C: ConnectionTrait>(db: &C, tag_id: i32) -> Result<u64, DbErr> {
    owned_query::delete_any::<tag::Entity, _>(db, tag_id).await
}
