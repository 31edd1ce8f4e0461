//! Database operations for repositories.

use chrono::{DateTime, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::repository;
use crate::error::{AppError, AppResult};

/// Register a new repository for a user. Fails if the natural key
/// (user, domain, owner, name) is already taken.
pub async fn insert(
    db: &DatabaseConnection,
    user_id: Uuid,
    github_domain: &str,
    owner: &str,
    name: &str,
) -> AppResult<repository::Model> {
    let existing = repository::Entity::find()
        .filter(repository::Column::UserId.eq(user_id))
        .filter(repository::Column::GithubDomain.eq(github_domain))
        .filter(repository::Column::Owner.eq(owner))
        .filter(repository::Column::Name.eq(name))
        .one(db)
        .await?;

    if existing.is_some() {
        return Err(AppError::InvalidInput(format!(
            "Repository {}/{} is already registered",
            owner, name
        )));
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    let model = repository::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        github_domain: Set(github_domain.to_string()),
        owner: Set(owner.to_string()),
        name: Set(name.to_string()),
        full_name: Set(format!("{}/{}", owner, name)),
        description: Set(None),
        issue_count: Set(0),
        open_issue_count: Set(0),
        cached_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let inserted = model.insert(db).await?;
    Ok(inserted)
}

/// Find a repository by ID.
pub async fn find_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> AppResult<Option<repository::Model>> {
    let result = repository::Entity::find_by_id(id).one(db).await?;
    Ok(result)
}

/// Find a repository by ID, scoped to its owning user.
pub async fn find_by_id_for_user(
    db: &DatabaseConnection,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<Option<repository::Model>> {
    let result = repository::Entity::find_by_id(id)
        .filter(repository::Column::UserId.eq(user_id))
        .one(db)
        .await?;

    Ok(result)
}

/// List all repositories for a user, most recently registered first.
pub async fn list_for_user(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> AppResult<Vec<repository::Model>> {
    let result = repository::Entity::find()
        .filter(repository::Column::UserId.eq(user_id))
        .order_by_desc(repository::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(result)
}

/// Delete a repository. Issues, comments, and assignable users cascade at
/// the database level.
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> AppResult<bool> {
    let result = repository::Entity::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Find repositories whose cache is stale: never synced, or last synced
/// before the cutoff.
pub async fn find_stale(
    db: &DatabaseConnection,
    cutoff: DateTime<Utc>,
    limit: u64,
) -> AppResult<Vec<repository::Model>> {
    let result = repository::Entity::find()
        .filter(
            Condition::any()
                .add(repository::Column::CachedAt.is_null())
                .add(repository::Column::CachedAt.lt(cutoff)),
        )
        .order_by_asc(repository::Column::CachedAt)
        .limit(limit)
        .all(db)
        .await?;

    Ok(result)
}

/// Record a fully successful sync: refresh the cached metadata and advance
/// `cached_at`. Only called after every fetch in the pass succeeded, which
/// keeps `cached_at` monotonically non-decreasing.
pub async fn mark_synced(
    db: &DatabaseConnection,
    model: repository::Model,
    full_name: &str,
    description: Option<&str>,
    issue_count: i32,
    open_issue_count: i32,
    synced_at: DateTime<Utc>,
) -> AppResult<repository::Model> {
    let mut active: repository::ActiveModel = model.into();
    active.full_name = Set(full_name.to_string());
    active.description = Set(description.map(|s| s.to_string()));
    active.issue_count = Set(issue_count);
    active.open_issue_count = Set(open_issue_count);
    active.cached_at = Set(Some(synced_at));
    active.updated_at = Set(synced_at);

    let updated = active.update(db).await?;
    Ok(updated)
}
