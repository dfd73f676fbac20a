pub mod auth_service;
pub mod image_service;
pub mod media_storage;
