use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::entities::recipe;
use crate::db::services::{NamedItem, NewRecipe, RecipeChanges, RecipeDetail, RecipeRecord};
use crate::services::media_storage::MediaStorage;
use crate::web::error::AppError;
use crate::web::models::{MAX_NAME_LENGTH, check_length, required_text};

const PRICE_MAX_DIGITS: u32 = 5;
const PRICE_DECIMAL_PLACES: u32 = 2;

/// Body accepted by create, full update and partial update.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<i32>>,
}

impl RecipeRequest {
    /// Validates a create request; title, time_minutes and price are required.
    pub fn into_new_recipe(self) -> Result<NewRecipe, AppError> {
        let title = required_text("title", self.title, MAX_NAME_LENGTH)?;
        let time_minutes = validate_time_minutes(required("time_minutes", self.time_minutes)?)?;
        let price_cents = validate_price(required("price", self.price)?)?;
        let link = validate_link(self.link)?.unwrap_or_default();

        Ok(NewRecipe {
            title,
            time_minutes,
            price_cents,
            link,
            tag_ids: self.tags.unwrap_or_default(),
            ingredient_ids: self.ingredients.unwrap_or_default(),
        })
    }

    /// Validates an update. A full update needs every required field and
    /// resets the tag and ingredient sets when they are omitted.
    pub fn into_changes(self, partial: bool) -> Result<RecipeChanges, AppError> {
        let title = match (self.title, partial) {
            (None, true) => None,
            (title, _) => Some(required_text("title", title, MAX_NAME_LENGTH)?),
        };
        let time_minutes = match (self.time_minutes, partial) {
            (None, true) => None,
            (value, _) => Some(validate_time_minutes(required("time_minutes", value)?)?),
        };
        let price_cents = match (self.price, partial) {
            (None, true) => None,
            (value, _) => Some(validate_price(required("price", value)?)?),
        };
        let (tag_ids, ingredient_ids) = if partial {
            (self.tags, self.ingredients)
        } else {
            (
                Some(self.tags.unwrap_or_default()),
                Some(self.ingredients.unwrap_or_default()),
            )
        };

        Ok(RecipeChanges {
            title,
            time_minutes,
            price_cents,
            link: validate_link(self.link)?,
            tag_ids,
            ingredient_ids,
        })
    }
}

fn required<T>(field: &str, value: Option<T>) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::InvalidInput(format!("{field}: This field is required.")))
}

fn validate_time_minutes(value: i32) -> Result<i32, AppError> {
    if value < 0 {
        return Err(AppError::InvalidInput(
            "time_minutes: Ensure this value is greater than or equal to 0.".to_string(),
        ));
    }
    Ok(value)
}

/// Accepts what a DECIMAL(5, 2) column would: non-negative, at most two
/// decimal places and three integer digits. Returns the price in cents.
fn validate_price(value: Decimal) -> Result<i64, AppError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::InvalidInput(
            "price: Ensure this value is greater than or equal to 0.".to_string(),
        ));
    }
    let value = value.normalize();
    if value.scale() > PRICE_DECIMAL_PLACES {
        return Err(AppError::InvalidInput(format!(
            "price: Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."
        )));
    }
    let integer_limit = Decimal::from(10_i64.pow(PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES));
    if value >= integer_limit {
        return Err(AppError::InvalidInput(format!(
            "price: Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."
        )));
    }
    let mut cents = value;
    cents.rescale(PRICE_DECIMAL_PLACES);
    i64::try_from(cents.mantissa())
        .map_err(|_| AppError::InvalidInput("price: A valid number is required.".to_string()))
}

fn validate_link(link: Option<String>) -> Result<Option<String>, AppError> {
    let Some(link) = link else {
        return Ok(None);
    };
    let link = link.trim().to_string();
    check_length("link", &link, MAX_NAME_LENGTH)?;
    Ok(Some(link))
}

/// Prices always render with two decimal places, e.g. `"7.00"`.
pub fn price_from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, PRICE_DECIMAL_PLACES)
}

/// List/create/update representation: related objects as ids.
#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: i32,
    pub title: String,
    pub ingredients: Vec<i32>,
    pub tags: Vec<i32>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
}

impl From<RecipeRecord> for RecipeResponse {
    fn from(record: RecipeRecord) -> Self {
        let RecipeRecord { recipe, tag_ids, ingredient_ids } = record;
        Self {
            id: recipe.id,
            title: recipe.title,
            ingredients: ingredient_ids,
            tags: tag_ids,
            time_minutes: recipe.time_minutes,
            price: price_from_cents(recipe.price_cents),
            link: recipe.link,
        }
    }
}

/// Retrieve representation: related objects nested, plus the image URL.
#[derive(Debug, Serialize)]
pub struct RecipeDetailResponse {
    pub id: i32,
    pub title: String,
    pub ingredients: Vec<NamedItem>,
    pub tags: Vec<NamedItem>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
}

impl RecipeDetailResponse {
    pub fn new(detail: RecipeDetail, storage: &dyn MediaStorage) -> Self {
        let RecipeDetail { recipe, tags, ingredients } = detail;
        Self {
            id: recipe.id,
            title: recipe.title,
            ingredients: ingredients.into_iter().map(NamedItem::from).collect(),
            tags: tags.into_iter().map(NamedItem::from).collect(),
            time_minutes: recipe.time_minutes,
            price: price_from_cents(recipe.price_cents),
            link: recipe.link,
            image: recipe.image.as_deref().map(|path| storage.url(path)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeImageResponse {
    pub id: i32,
    pub image: Option<String>,
}

impl RecipeImageResponse {
    pub fn new(recipe: &recipe::Model, storage: &dyn MediaStorage) -> Self {
        Self {
            id: recipe.id,
            image: recipe.image.as_deref().map(|path| storage.url(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn full_request() -> RecipeRequest {
        RecipeRequest {
            title: Some("Borsch".to_string()),
            time_minutes: Some(30),
            price: Some(dec("7.99")),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_requires_core_fields() {
        let missing_price = RecipeRequest { price: None, ..full_request() };
        assert!(matches!(missing_price.into_new_recipe(), Err(AppError::InvalidInput(msg)) if msg.starts_with("price")));

        let blank_title = RecipeRequest { title: Some(" ".to_string()), ..full_request() };
        assert!(blank_title.into_new_recipe().is_err());

        let new_recipe = full_request().into_new_recipe().unwrap();
        assert_eq!(new_recipe.title, "Borsch");
        assert_eq!(new_recipe.link, "");
        assert!(new_recipe.tag_ids.is_empty());
    }

    #[test]
    fn test_price_rules() {
        assert_eq!(validate_price(dec("7.990")).unwrap(), 799);
        assert_eq!(validate_price(dec("999.99")).unwrap(), 99999);
        assert_eq!(validate_price(dec("5")).unwrap(), 500);
        assert!(validate_price(dec("1000")).is_err());
        assert!(validate_price(dec("1.999")).is_err());
        assert!(validate_price(dec("-1")).is_err());
        assert_eq!(validate_price(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_negative_time_rejected() {
        let request = RecipeRequest { time_minutes: Some(-5), ..full_request() };
        assert!(request.into_new_recipe().is_err());
    }

    #[test]
    fn test_partial_changes_only_touch_given_fields() {
        let request = RecipeRequest {
            title: Some("Updated".to_string()),
            ..Default::default()
        };
        let changes = request.into_changes(true).unwrap();
        assert_eq!(changes.title.as_deref(), Some("Updated"));
        assert!(changes.time_minutes.is_none());
        assert!(changes.price_cents.is_none());
        assert!(changes.tag_ids.is_none());
        assert!(changes.ingredient_ids.is_none());
    }

    #[test]
    fn test_full_update_requires_fields_and_resets_relations() {
        let incomplete = RecipeRequest {
            title: Some("Updated".to_string()),
            ..Default::default()
        };
        assert!(incomplete.into_changes(false).is_err());

        let changes = full_request().into_changes(false).unwrap();
        assert_eq!(changes.tag_ids, Some(Vec::new()));
        assert_eq!(changes.ingredient_ids, Some(Vec::new()));
    }

    #[test]
    fn test_price_renders_two_places() {
        assert_eq!(price_from_cents(700).to_string(), "7.00");
        assert_eq!(price_from_cents(830).to_string(), "8.30");
    }
}
