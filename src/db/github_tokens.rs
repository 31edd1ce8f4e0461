//! Database operations for GitHub tokens.
//!
//! Tokens are stored encrypted; this module only ever sees ciphertext. The
//! encrypt/decrypt boundary lives in `services::token_cipher`.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::github_token;
use crate::error::AppResult;

/// Find the token for (user, domain). Consumed read-only by the sync job.
pub async fn find_by_user_and_domain(
    db: &DatabaseConnection,
    user_id: Uuid,
    domain: &str,
) -> AppResult<Option<github_token::Model>> {
    let result = github_token::Entity::find()
        .filter(github_token::Column::UserId.eq(user_id))
        .filter(github_token::Column::Domain.eq(domain))
        .one(db)
        .await?;

    Ok(result)
}

/// List all tokens for a user, ordered by domain.
pub async fn list_for_user(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> AppResult<Vec<github_token::Model>> {
    let result = github_token::Entity::find()
        .filter(github_token::Column::UserId.eq(user_id))
        .order_by_asc(github_token::Column::Domain)
        .all(db)
        .await?;

    Ok(result)
}

/// Upsert the token for (user, domain), replacing the stored ciphertext.
pub async fn upsert(
    db: &DatabaseConnection,
    user_id: Uuid,
    domain: &str,
    token_ciphertext: &str,
) -> AppResult<github_token::Model> {
    let now = Utc::now();

    if let Some(m) = find_by_user_and_domain(db, user_id, domain).await? {
        let mut active: github_token::ActiveModel = m.into();
        active.token_ciphertext = Set(token_ciphertext.to_string());
        active.updated_at = Set(now);
        let updated = active.update(db).await?;
        return Ok(updated);
    }

    let id = Uuid::new_v4();
    let model = github_token::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        domain: Set(domain.to_string()),
        token_ciphertext: Set(token_ciphertext.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let inserted = model.insert(db).await?;
    Ok(inserted)
}

/// Delete the token for (user, domain). Returns true if a row was removed.
pub async fn delete_by_domain(
    db: &DatabaseConnection,
    user_id: Uuid,
    domain: &str,
) -> AppResult<bool> {
    let result = github_token::Entity::delete_many()
        .filter(github_token::Column::UserId.eq(user_id))
        .filter(github_token::Column::Domain.eq(domain))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}
