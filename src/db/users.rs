//! Database operations for users.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::user;
use crate::error::{AppError, AppResult};

/// Find a user by email, creating one on first login.
pub async fn find_or_create_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> AppResult<user::Model> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;

    if let Some(m) = existing {
        return Ok(m);
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    let model = user::ActiveModel {
        id: Set(id),
        email: Set(email.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    user::Entity::insert(model).exec(db).await?;

    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Database("Failed to fetch newly inserted user".to_string()))
}

/// Find a user by ID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<user::Model>> {
    let result = user::Entity::find_by_id(id).one(db).await?;
    Ok(result)
}
