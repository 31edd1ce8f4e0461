//! Database operations for cached issue comments.

use chrono::{DateTime, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::issue_comment;
use crate::error::AppResult;

/// Fields written by the sync job for one comment.
#[derive(Debug, Clone)]
pub struct CommentWrite {
    pub github_id: i64,
    pub body: Option<String>,
    pub author_login: Option<String>,
    pub author_avatar_url: Option<String>,
    pub github_created_at: DateTime<Utc>,
}

/// List comments for an issue in chronological order.
pub async fn list_for_issue(
    db: &DatabaseConnection,
    issue_id: Uuid,
) -> AppResult<Vec<issue_comment::Model>> {
    let result = issue_comment::Entity::find()
        .filter(issue_comment::Column::IssueId.eq(issue_id))
        .order_by_asc(issue_comment::Column::GithubCreatedAt)
        .all(db)
        .await?;

    Ok(result)
}

/// Upsert a comment by its natural key (issue_id, github_id). Comments are
/// immutable snapshots, so an existing row is left untouched.
pub async fn upsert(
    db: &DatabaseConnection,
    issue_id: Uuid,
    write: CommentWrite,
    synced_at: DateTime<Utc>,
) -> AppResult<()> {
    let existing = issue_comment::Entity::find()
        .filter(issue_comment::Column::IssueId.eq(issue_id))
        .filter(issue_comment::Column::GithubId.eq(write.github_id))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let model = issue_comment::ActiveModel {
        id: Set(Uuid::new_v4()),
        issue_id: Set(issue_id),
        github_id: Set(write.github_id),
        body: Set(write.body),
        author_login: Set(write.author_login),
        author_avatar_url: Set(write.author_avatar_url),
        github_created_at: Set(write.github_created_at),
        created_at: Set(synced_at),
    };

    issue_comment::Entity::insert(model).exec(db).await?;
    Ok(())
}
