use serde::{Deserialize, Serialize};

use crate::web::error::AppError;

pub mod admin_models;
pub mod recipe_models;

pub const MAX_NAME_LENGTH: usize = 255;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Public profile representation. Never carries the password.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (email)
    pub user_id: i32,
    pub exp: usize,  // Expiration time (timestamp)
}

/// Struct to hold authenticated user details, to be passed as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
    pub is_staff: bool,
}

/// Body for creating or renaming a tag or ingredient.
#[derive(Debug, Default, Deserialize)]
pub struct NamedItemRequest {
    pub name: Option<String>,
}

impl NamedItemRequest {
    pub fn validated_name(self) -> Result<String, AppError> {
        required_text("name", self.name, MAX_NAME_LENGTH)
    }
}

/// Trims `value` and rejects it when missing, blank or longer than `max_len` characters.
pub fn required_text(field: &str, value: Option<String>, max_len: usize) -> Result<String, AppError> {
    let Some(value) = value else {
        return Err(AppError::InvalidInput(format!("{field}: This field is required.")));
    };
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{field}: This field may not be blank.")));
    }
    check_length(field, &value, max_len)?;
    Ok(value)
}

pub fn check_length(field: &str, value: &str, max_len: usize) -> Result<(), AppError> {
    if value.chars().count() > max_len {
        return Err(AppError::InvalidInput(format!(
            "{field}: Ensure this field has no more than {max_len} characters."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_item_validation() {
        let ok = NamedItemRequest { name: Some("  Vegan ".to_string()) };
        assert_eq!(ok.validated_name().unwrap(), "Vegan");

        let blank = NamedItemRequest { name: Some("   ".to_string()) };
        assert!(matches!(blank.validated_name(), Err(AppError::InvalidInput(msg)) if msg.contains("blank")));

        let missing = NamedItemRequest { name: None };
        assert!(matches!(missing.validated_name(), Err(AppError::InvalidInput(msg)) if msg.contains("required")));

        let long = NamedItemRequest { name: Some("x".repeat(MAX_NAME_LENGTH + 1)) };
        assert!(long.validated_name().is_err());
    }
}
