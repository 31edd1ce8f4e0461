//! Database operations for the denormalized assignable-user index.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::repository_assignable_user as assignable;
use crate::error::AppResult;

/// List the cached assignable users for a repository, ordered by login.
pub async fn list_for_repository(
    db: &DatabaseConnection,
    repository_id: Uuid,
) -> AppResult<Vec<assignable::Model>> {
    let result = assignable::Entity::find()
        .filter(assignable::Column::RepositoryId.eq(repository_id))
        .order_by_asc(assignable::Column::Login)
        .all(db)
        .await?;

    Ok(result)
}

/// Autocomplete search over cached logins (case-insensitive substring).
pub async fn search(
    db: &DatabaseConnection,
    repository_id: Uuid,
    query: &str,
    limit: u64,
) -> AppResult<Vec<assignable::Model>> {
    let pattern = format!("%{}%", query);

    let result = assignable::Entity::find()
        .filter(assignable::Column::RepositoryId.eq(repository_id))
        .filter(Expr::cust_with_values("login ILIKE ?", [pattern]))
        .order_by_asc(assignable::Column::Login)
        .limit(limit)
        .all(db)
        .await?;

    Ok(result)
}

/// Upsert one assignable user by the natural key (repository_id, login),
/// overwriting the avatar URL for an existing row.
pub async fn upsert(
    db: &DatabaseConnection,
    repository_id: Uuid,
    login: &str,
    avatar_url: Option<&str>,
    synced_at: DateTime<Utc>,
) -> AppResult<()> {
    let existing = assignable::Entity::find()
        .filter(assignable::Column::RepositoryId.eq(repository_id))
        .filter(assignable::Column::Login.eq(login))
        .one(db)
        .await?;

    if let Some(m) = existing {
        let mut active: assignable::ActiveModel = m.into();
        active.avatar_url = Set(avatar_url.map(|s| s.to_string()));
        active.updated_at = Set(synced_at);
        active.update(db).await?;
        return Ok(());
    }

    let model = assignable::ActiveModel {
        id: Set(Uuid::new_v4()),
        repository_id: Set(repository_id),
        login: Set(login.to_string()),
        avatar_url: Set(avatar_url.map(|s| s.to_string())),
        created_at: Set(synced_at),
        updated_at: Set(synced_at),
    };

    assignable::Entity::insert(model).exec(db).await?;
    Ok(())
}

/// Delete cached logins absent from the latest upstream response. Used only
/// in replace reconciliation mode.
pub async fn delete_logins(
    db: &DatabaseConnection,
    repository_id: Uuid,
    logins: &[String],
) -> AppResult<u64> {
    if logins.is_empty() {
        return Ok(0);
    }

    let result = assignable::Entity::delete_many()
        .filter(assignable::Column::RepositoryId.eq(repository_id))
        .filter(assignable::Column::Login.is_in(logins.iter().cloned()))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
