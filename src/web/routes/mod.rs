pub mod admin_routes;
pub mod recipe_routes;
pub mod reference_routes;
pub mod user_routes;
