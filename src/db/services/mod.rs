//! The `services` module provides a high-level API for interacting with the database.
//! It encapsulates the query composition and data access patterns, allowing the
//! HTTP handlers to work with entity models without building queries themselves.
//!
//! Every tenant-facing function takes the requesting user's id and filters on it;
//! the `*_as_admin` / `list_all_*` variants are reserved for the admin console.

pub mod ingredient_service;
pub mod owned_query;
pub mod recipe_service;
pub mod reference_store;
pub mod tag_service;
pub mod user_service;

pub use recipe_service::{NewRecipe, RecipeChanges, RecipeDetail, RecipeFilter, RecipeRecord};
pub use reference_store::{IngredientStore, NamedItem, ReferenceStore, TagStore};
pub use user_service::{NewUser, UserChanges};
