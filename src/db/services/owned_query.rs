//! Queries shared by the per-user reference tables (tags and ingredients).
//! Both tables have an id, an owning user, a name and a join table linking
//! them to recipes, so every owner-scoped read and delete is written once here.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationDef, RelationTrait,
};

use crate::db::entities::{ingredient, tag};

/// An entity owned by a single user and attachable to recipes.
pub trait OwnedEntity: EntityTrait {
    fn id_column() -> Self::Column;
    fn owner_column() -> Self::Column;
    fn name_column() -> Self::Column;
    /// Relation from the entity to its recipe join table.
    fn recipe_link() -> RelationDef;
}

impl OwnedEntity for tag::Entity {
    fn id_column() -> Self::Column {
        tag::Column::Id
    }

    fn owner_column() -> Self::Column {
        tag::Column::UserId
    }

    fn name_column() -> Self::Column {
        tag::Column::Name
    }

    fn recipe_link() -> RelationDef {
        tag::Relation::RecipeTags.def()
    }
}

impl OwnedEntity for ingredient::Entity {
    fn id_column() -> Self::Column {
        ingredient::Column::Id
    }

    fn owner_column() -> Self::Column {
        ingredient::Column::UserId
    }

    fn name_column() -> Self::Column {
        ingredient::Column::Name
    }

    fn recipe_link() -> RelationDef {
        ingredient::Relation::RecipeIngredients.def()
    }
}

/// The user's rows, name descending then id descending.
/// With `assigned_only`, only rows attached to at least one recipe are returned, each once.
pub async fn list_owned<E: OwnedEntity, C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    assigned_only: bool,
) -> Result<Vec<E::Model>, DbErr> {
    let mut query = E::find().filter(E::owner_column().eq(user_id));
    if assigned_only {
        query = query.join(JoinType::InnerJoin, E::recipe_link()).distinct();
    }
    query
        .order_by_desc(E::name_column())
        .order_by_desc(E::id_column())
        .all(db)
        .await
}

pub async fn find_owned<E: OwnedEntity, C: ConnectionTrait>(
    db: &C,
    id: i32,
    user_id: i32,
) -> Result<Option<E::Model>, DbErr> {
    E::find()
        .filter(E::id_column().eq(id))
        .filter(E::owner_column().eq(user_id))
        .one(db)
        .await
}

/// Deletes the row only if the user owns it. Join-table rows go with it via ON DELETE CASCADE.
pub async fn delete_owned<E: OwnedEntity, C: ConnectionTrait>(db: &C, id: i32, user_id: i32) -> Result<u64, DbErr> {
    let result = E::delete_many()
        .filter(E::id_column().eq(id))
        .filter(E::owner_column().eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Counts how many of `ids` exist and belong to the user.
pub async fn count_owned<E, C>(db: &C, user_id: i32, ids: &[i32]) -> Result<u64, DbErr>
where
    E: OwnedEntity,
    E::Model: Sync,
    C: ConnectionTrait,
{
    E::find()
        .filter(E::owner_column().eq(user_id))
        .filter(E::id_column().is_in(ids.iter().copied()))
        .count(db)
        .await
}

/// Every row across all users, id ascending.
pub async fn list_all<E: OwnedEntity, C: ConnectionTrait>(db: &C) -> Result<Vec<E::Model>, DbErr> {
    E::find().order_by_asc(E::id_column()).all(db).await
}

/// Deletes a row regardless of owner.
pub async fn delete_any<E: OwnedEntity, C: ConnectionTrait>(db: &C, id: i32) -> Result<u64, DbErr> {
    let result = E::delete_many().filter(E::id_column().eq(id)).exec(db).await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::TestApp;

    #[tokio::test]
    async fn test_owner_scoping_applies_to_both_tables() {
        let app = TestApp::new().await;
        let user = app.create_user("test@example.com", "testpass").await;
        let other = app.create_user("other@example.com", "testpass").await;
        let tag = app.create_tag(user.id, "Vegan").await;
        let ingredient = app.create_ingredient(other.id, "Kale").await;

        assert!(find_owned::<tag::Entity, _>(&app.db, tag.id, user.id).await.unwrap().is_some());
        assert!(find_owned::<tag::Entity, _>(&app.db, tag.id, other.id).await.unwrap().is_none());
        assert_eq!(delete_owned::<ingredient::Entity, _>(&app.db, ingredient.id, user.id).await.unwrap(), 0);
        assert_eq!(count_owned::<ingredient::Entity, _>(&app.db, other.id, &[ingredient.id, 999]).await.unwrap(), 1);
        assert_eq!(delete_any::<ingredient::Entity, _>(&app.db, ingredient.id).await.unwrap(), 1);
        assert!(list_all::<ingredient::Entity, _>(&app.db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_owned_orders_and_filters_assigned() {
        let app = TestApp::new().await;
        let user = app.create_user("test@example.com", "testpass").await;
        let flour = app.create_ingredient(user.id, "Flour").await;
        app.create_ingredient(user.id, "Sugar").await;
        app.create_recipe(user.id, "Bread", &[], &[flour.id]).await;
        app.create_recipe(user.id, "Pizza", &[], &[flour.id]).await;

        let names: Vec<_> = list_owned::<ingredient::Entity, _>(&app.db, user.id, false)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Sugar", "Flour"]);

        let assigned = list_owned::<ingredient::Entity, _>(&app.db, user.id, true).await.unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].id, flour.id);
    }
}
