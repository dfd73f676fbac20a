use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::Query,
};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::db::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};
use crate::db::services::owned_query::{self, OwnedEntity};
use crate::web::error::AppError;

// --- Recipe Service Types ---

/// Restricts a recipe listing. Within one list the ids are OR-ed; when both
/// lists are given a recipe must match each of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tag_ids: Option<Vec<i32>>,
    pub ingredient_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price_cents: i64,
    pub link: String,
    pub tag_ids: Vec<i32>,
    pub ingredient_ids: Vec<i32>,
}

/// Optional changes to a recipe; `None` leaves a field untouched and a
/// provided id list replaces the current set.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price_cents: Option<i64>,
    pub link: Option<String>,
    pub tag_ids: Option<Vec<i32>>,
    pub ingredient_ids: Option<Vec<i32>>,
}

/// A recipe with the ids of its tags and ingredients.
#[derive(Debug, Clone)]
pub struct RecipeRecord {
    pub recipe: recipe::Model,
    pub tag_ids: Vec<i32>,
    pub ingredient_ids: Vec<i32>,
}

/// A recipe with its tags and ingredients fully loaded.
#[derive(Debug, Clone)]
pub struct RecipeDetail {
    pub recipe: recipe::Model,
    pub tags: Vec<tag::Model>,
    pub ingredients: Vec<ingredient::Model>,
}

// --- Reads ---

/// Lists the user's recipes, newest first, applying `filter`.
pub async fn get_recipes_by_user_id<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    filter: &RecipeFilter,
) -> Result<Vec<RecipeRecord>, DbErr> {
    let mut query = recipe::Entity::find().filter(recipe::Column::UserId.eq(user_id));

    // Sub-selects instead of joins so a recipe matching several ids is listed once.
    if let Some(tag_ids) = &filter.tag_ids {
        query = query.filter(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column(recipe_tag::Column::RecipeId)
                    .from(recipe_tag::Entity)
                    .and_where(recipe_tag::Column::TagId.is_in(tag_ids.iter().copied()))
                    .to_owned(),
            ),
        );
    }
    if let Some(ingredient_ids) = &filter.ingredient_ids {
        query = query.filter(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column(recipe_ingredient::Column::RecipeId)
                    .from(recipe_ingredient::Entity)
                    .and_where(
                        recipe_ingredient::Column::IngredientId.is_in(ingredient_ids.iter().copied()),
                    )
                    .to_owned(),
            ),
        );
    }

    let recipes = query.order_by_desc(recipe::Column::Id).all(db).await?;
    attach_relation_ids(db, recipes).await
}

/// Retrieves a recipe if it belongs to the user.
pub async fn get_recipe<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    user_id: i32,
) -> Result<Option<recipe::Model>, DbErr> {
    recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(db)
        .await
}

/// Retrieves a recipe with the ids of its tags and ingredients.
pub async fn get_recipe_record<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    user_id: i32,
) -> Result<Option<RecipeRecord>, DbErr> {
    let Some(recipe_model) = get_recipe(db, recipe_id, user_id).await? else {
        return Ok(None);
    };
    let mut records = attach_relation_ids(db, vec![recipe_model]).await?;
    Ok(records.pop())
}

/// Retrieves a recipe with nested tags and ingredients.
pub async fn get_recipe_detail<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    user_id: i32,
) -> Result<Option<RecipeDetail>, DbErr> {
    let Some(recipe_model) = get_recipe(db, recipe_id, user_id).await? else {
        return Ok(None);
    };
    let tags = recipe_model
        .find_related(tag::Entity)
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await?;
    let ingredients = recipe_model
        .find_related(ingredient::Entity)
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await?;

    Ok(Some(RecipeDetail {
        recipe: recipe_model,
        tags,
        ingredients,
    }))
}

/// Every recipe across all users, for the admin console.
pub async fn list_all_recipes<C: ConnectionTrait>(db: &C) -> Result<Vec<RecipeRecord>, DbErr> {
    let recipes = recipe::Entity::find()
        .order_by_asc(recipe::Column::Id)
        .all(db)
        .await?;
    attach_relation_ids(db, recipes).await
}

async fn attach_relation_ids<C: ConnectionTrait>(
    db: &C,
    recipes: Vec<recipe::Model>,
) -> Result<Vec<RecipeRecord>, DbErr> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();

    let mut tags_by_recipe: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .order_by_asc(recipe_tag::Column::TagId)
        .all(db)
        .await?
    {
        tags_by_recipe.entry(row.recipe_id).or_default().push(row.tag_id);
    }

    let mut ingredients_by_recipe: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .order_by_asc(recipe_ingredient::Column::IngredientId)
        .all(db)
        .await?
    {
        ingredients_by_recipe
            .entry(row.recipe_id)
            .or_default()
            .push(row.ingredient_id);
    }

    Ok(recipes
        .into_iter()
        .map(|recipe_model| RecipeRecord {
            tag_ids: tags_by_recipe.remove(&recipe_model.id).unwrap_or_default(),
            ingredient_ids: ingredients_by_recipe
                .remove(&recipe_model.id)
                .unwrap_or_default(),
            recipe: recipe_model,
        })
        .collect())
}

// --- Writes ---

/// Creates a recipe owned by `user_id` together with its tag and ingredient links.
pub async fn create_recipe(
    db: &DatabaseConnection,
    user_id: i32,
    new_recipe: NewRecipe,
) -> Result<RecipeRecord, AppError> {
    let txn = db.begin().await?;

    let tag_ids = ensure_owned::<tag::Entity, _>(&txn, user_id, new_recipe.tag_ids, "tags").await?;
    let ingredient_ids = ensure_owned::<ingredient::Entity, _>(&txn, user_id, new_recipe.ingredient_ids, "ingredients").await?;

    let now = Utc::now();
    let recipe_model = recipe::ActiveModel {
        user_id: Set(user_id),
        title: Set(new_recipe.title),
        time_minutes: Set(new_recipe.time_minutes),
        price_cents: Set(new_recipe.price_cents),
        link: Set(new_recipe.link),
        image: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    link_tags(&txn, recipe_model.id, &tag_ids).await?;
    link_ingredients(&txn, recipe_model.id, &ingredient_ids).await?;

    txn.commit().await?;
    debug!(recipe_id = recipe_model.id, user_id, "Recipe created.");

    Ok(RecipeRecord {
        recipe: recipe_model,
        tag_ids,
        ingredient_ids,
    })
}

/// Applies `changes` to one of the user's recipes. Returns `None` if the
/// recipe does not exist or belongs to someone else.
pub async fn update_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
    changes: RecipeChanges,
) -> Result<Option<RecipeRecord>, AppError> {
    let txn = db.begin().await?;

    let Some(existing) = get_recipe(&txn, recipe_id, user_id).await? else {
        return Ok(None);
    };

    let mut active: recipe::ActiveModel = existing.into();
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(time_minutes) = changes.time_minutes {
        active.time_minutes = Set(time_minutes);
    }
    if let Some(price_cents) = changes.price_cents {
        active.price_cents = Set(price_cents);
    }
    if let Some(link) = changes.link {
        active.link = Set(link);
    }
    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;

    if let Some(tag_ids) = changes.tag_ids {
        let tag_ids = ensure_owned::<tag::Entity, _>(&txn, user_id, tag_ids, "tags").await?;
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        link_tags(&txn, recipe_id, &tag_ids).await?;
    }
    if let Some(ingredient_ids) = changes.ingredient_ids {
        let ingredient_ids = ensure_owned::<ingredient::Entity, _>(&txn, user_id, ingredient_ids, "ingredients").await?;
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        link_ingredients(&txn, recipe_id, &ingredient_ids).await?;
    }

    let record = get_recipe_record(&txn, recipe_id, user_id).await?;
    txn.commit().await?;
    Ok(record)
}

/// Points the recipe at a newly stored image and returns the updated row.
pub async fn set_recipe_image<C: ConnectionTrait>(
    db: &C,
    recipe_model: recipe::Model,
    image_path: &str,
) -> Result<recipe::Model, DbErr> {
    let mut active: recipe::ActiveModel = recipe_model.into();
    active.image = Set(Some(image_path.to_string()));
    active.updated_at = Set(Utc::now());
    active.update(db).await
}

/// Deletes one of the user's recipes and returns it, so the caller can
/// clean up its stored image.
pub async fn delete_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
) -> Result<Option<recipe::Model>, DbErr> {
    let txn = db.begin().await?;
    let Some(existing) = get_recipe(&txn, recipe_id, user_id).await? else {
        return Ok(None);
    };
    delete_with_links(&txn, existing.id).await?;
    txn.commit().await?;
    Ok(Some(existing))
}

/// Deletes any recipe regardless of owner.
pub async fn delete_recipe_as_admin(
    db: &DatabaseConnection,
    recipe_id: i32,
) -> Result<Option<recipe::Model>, DbErr> {
    let txn = db.begin().await?;
    let Some(existing) = recipe::Entity::find_by_id(recipe_id).one(&txn).await? else {
        return Ok(None);
    };
    delete_with_links(&txn, existing.id).await?;
    txn.commit().await?;
    Ok(Some(existing))
}

async fn delete_with_links<C: ConnectionTrait>(db: &C, recipe_id: i32) -> Result<(), DbErr> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    recipe::Entity::delete_by_id(recipe_id).exec(db).await?;
    Ok(())
}

fn dedup_ids(ids: Vec<i32>) -> Vec<i32> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Deduplicates `ids` and checks that every one names a row the user owns.
async fn ensure_owned<E, C>(db: &C, user_id: i32, ids: Vec<i32>, field: &str) -> Result<Vec<i32>, AppError>
where
    E: OwnedEntity,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let ids = dedup_ids(ids);
    if ids.is_empty() {
        return Ok(ids);
    }
    let owned = owned_query::count_owned::<E, _>(db, user_id, &ids).await?;
    if owned != ids.len() as u64 {
        return Err(AppError::InvalidInput(format!(
            "{field}: one or more {field} do not exist."
        )));
    }
    Ok(ids)
}

async fn link_tags<C: ConnectionTrait>(db: &C, recipe_id: i32, tag_ids: &[i32]) -> Result<(), DbErr> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let rows = tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    });
    recipe_tag::Entity::insert_many(rows).exec_without_returning(db).await?;
    Ok(())
}

async fn link_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    ingredient_ids: &[i32],
) -> Result<(), DbErr> {
    if ingredient_ids.is_empty() {
        return Ok(());
    }
    let rows = ingredient_ids
        .iter()
        .map(|&ingredient_id| recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(ingredient_id),
        });
    recipe_ingredient::Entity::insert_many(rows).exec_without_returning(db).await?;
    Ok(())
}
