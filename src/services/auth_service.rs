use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::db::entities::user;
use crate::db::services::{NewUser, UserChanges, user_service};
use crate::web::error::AppError;
use crate::web::models::{
    Claims, CreateUserRequest, MAX_NAME_LENGTH, TokenRequest, TokenResponse, UpdateUserRequest,
    check_length,
};

pub const MIN_PASSWORD_LENGTH: usize = 5;
const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Lower-cases the domain part of an address; the local part is case-sensitive.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        return Err(AppError::InvalidInput("email: This field may not be blank.".to_string()));
    }
    check_length("email", email, MAX_NAME_LENGTH)?;
    match email.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AppError::InvalidInput("email: Enter a valid email address.".to_string())),
    }
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "password: Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    Ok(())
}

fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::PasswordHashingError(e.to_string()))
}

/// Creates an account. Flags let the admin console and the CLI create staff users.
pub async fn create_account(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    name: &str,
    flags: (bool, bool, bool),
    bcrypt_cost: u32,
) -> Result<user::Model, AppError> {
    let (is_active, is_staff, is_superuser) = flags;
    let email = normalize_email(email);
    validate_email(&email)?;
    validate_password(password)?;
    let name = name.trim().to_string();
    check_length("name", &name, MAX_NAME_LENGTH)?;

    if user_service::get_user_by_email(db, &email).await?.is_some() {
        return Err(AppError::UserAlreadyExists(
            "email: user with this email already exists.".to_string(),
        ));
    }

    let password_hash = hash_password(password, bcrypt_cost)?;
    let user_model = user_service::create_user(
        db,
        NewUser {
            email,
            name,
            password_hash,
            is_active,
            is_staff,
            is_superuser,
        },
    )
    .await?;

    info!(user_id = user_model.id, is_staff, "User account created.");
    Ok(user_model)
}

/// Self-service registration: a regular, active, non-staff account.
pub async fn register_user(
    db: &DatabaseConnection,
    req: CreateUserRequest,
    bcrypt_cost: u32,
) -> Result<user::Model, AppError> {
    create_account(db, &req.email, &req.password, &req.name, (true, false, false), bcrypt_cost).await
}

/// Creates a staff account with every permission.
pub async fn create_superuser(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    name: &str,
    bcrypt_cost: u32,
) -> Result<user::Model, AppError> {
    create_account(db, email, password, name, (true, true, true), bcrypt_cost).await
}

/// Exchanges credentials for a token. Every failure is a 400 with the same message
/// so callers cannot tell which emails are registered.
pub async fn issue_token(
    db: &DatabaseConnection,
    req: TokenRequest,
    jwt_secret: &str,
) -> Result<TokenResponse, AppError> {
    let rejected = || {
        AppError::InvalidInput("Unable to authenticate with provided credentials".to_string())
    };

    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(rejected());
    }

    let email = normalize_email(&req.email);
    let Some(user_model) = user_service::get_user_by_email(db, &email).await? else {
        return Err(rejected());
    };
    if !user_model.is_active {
        return Err(rejected());
    }

    let valid_password = verify(&req.password, &user_model.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    if !valid_password {
        warn!(user_id = user_model.id, "Token request with wrong password.");
        return Err(rejected());
    }

    let user_model = user_service::touch_last_login(db, user_model).await?;
    let token = create_jwt_for_user(&user_model, jwt_secret)?;
    Ok(TokenResponse { token })
}

pub fn create_jwt_for_user(user: &user::Model, jwt_secret: &str) -> Result<String, AppError> {
    let expiration = (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp() as usize;

    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id,
        exp: expiration,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_secret.as_ref()))
        .map_err(|e| AppError::TokenCreationError(e.to_string()))
}

pub fn decode_jwt(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        warn!(error = ?e, "JWT decoding error.");
        AppError::InvalidCredentials
    })
}

/// Updates the caller's own profile.
pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: i32,
    req: UpdateUserRequest,
    bcrypt_cost: u32,
) -> Result<user::Model, AppError> {
    let mut changes = UserChanges::default();

    if let Some(email) = req.email {
        let email = normalize_email(&email);
        validate_email(&email)?;
        if let Some(other) = user_service::get_user_by_email(db, &email).await? {
            if other.id != user_id {
                return Err(AppError::UserAlreadyExists(
                    "email: user with this email already exists.".to_string(),
                ));
            }
        }
        changes.email = Some(email);
    }
    if let Some(name) = req.name {
        let name = name.trim().to_string();
        check_length("name", &name, MAX_NAME_LENGTH)?;
        changes.name = Some(name);
    }
    if let Some(password) = req.password {
        validate_password(&password)?;
        changes.password_hash = Some(hash_password(&password, bcrypt_cost)?);
    }

    user_service::update_user(db, user_id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Updates any account from the admin console.
pub async fn admin_update_user(
    db: &DatabaseConnection,
    user_id: i32,
    mut changes: UserChanges,
    password: Option<String>,
    bcrypt_cost: u32,
) -> Result<user::Model, AppError> {
    if let Some(email) = changes.email.take() {
        let email = normalize_email(&email);
        validate_email(&email)?;
        if let Some(other) = user_service::get_user_by_email(db, &email).await? {
            if other.id != user_id {
                return Err(AppError::UserAlreadyExists(
                    "email: user with this email already exists.".to_string(),
                ));
            }
        }
        changes.email = Some(email);
    }
    if let Some(name) = &changes.name {
        check_length("name", name, MAX_NAME_LENGTH)?;
    }
    if let Some(password) = password {
        validate_password(&password)?;
        changes.password_hash = Some(hash_password(&password, bcrypt_cost)?);
    }

    user_service::update_user(db, user_id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
