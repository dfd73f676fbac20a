use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::db::entities::user;

// --- User Service Functions ---

/// Fields an account is created with. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Optional changes applied to an existing account; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

/// Creates a new user.
pub async fn create_user(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model, DbErr> {
    let now = Utc::now();
    user::ActiveModel {
        email: Set(new_user.email),
        name: Set(new_user.name),
        password_hash: Set(new_user.password_hash),
        is_active: Set(new_user.is_active),
        is_staff: Set(new_user.is_staff),
        is_superuser: Set(new_user.is_superuser),
        last_login: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Retrieves a user by their ID.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i32) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find_by_id(user_id).one(db).await
}

/// Retrieves a user by their email.
pub async fn get_user_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

/// Lists every account, oldest first.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>, DbErr> {
    user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
}

/// Applies `changes` to the user. Returns `None` if the user does not exist.
pub async fn update_user(
    db: &DatabaseConnection,
    user_id: i32,
    changes: UserChanges,
) -> Result<Option<user::Model>, DbErr> {
    let Some(existing) = get_user_by_id(db, user_id).await? else {
        return Ok(None);
    };

    let mut active: user::ActiveModel = existing.into();
    if let Some(email) = changes.email {
        active.email = Set(email);
    }
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(password_hash) = changes.password_hash {
        active.password_hash = Set(password_hash);
    }
    if let Some(is_active) = changes.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_staff) = changes.is_staff {
        active.is_staff = Set(is_staff);
    }
    if let Some(is_superuser) = changes.is_superuser {
        active.is_superuser = Set(is_superuser);
    }
    active.updated_at = Set(Utc::now());

    active.update(db).await.map(Some)
}

/// Records a successful login.
pub async fn touch_last_login(db: &DatabaseConnection, user: user::Model) -> Result<user::Model, DbErr> {
    let mut active: user::ActiveModel = user.into();
    active.last_login = Set(Some(Utc::now()));
    active.update(db).await
}

/// Deletes a user. Owned tags, ingredients and recipes go with it.
pub async fn delete_user(db: &DatabaseConnection, user_id: i32) -> Result<u64, DbErr> {
    let result = user::Entity::delete_by_id(user_id).exec(db).await?;
    Ok(result.rows_affected)
}
