//! Database operations for cached issues, including the server-side
//! filter/search query composition.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::issue;
use crate::error::AppResult;

/// Fields written by the sync job for one issue.
#[derive(Debug, Clone)]
pub struct IssueWrite {
    pub number: i32,
    pub title: String,
    pub state: String,
    pub body: Option<String>,
    pub author_login: Option<String>,
    pub author_avatar_url: Option<String>,
    /// Ordered list of {name}
    pub labels: serde_json::Value,
    /// Ordered list of {login, avatar_url}
    pub assignees: serde_json::Value,
    pub comment_count: i32,
    pub github_created_at: DateTime<Utc>,
    pub github_updated_at: DateTime<Utc>,
}

/// Server-side filters over cached issue rows.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    /// Exact state match ('open' or 'closed')
    pub state: Option<String>,
    /// Label name, matched against the labels JSON list
    pub label: Option<String>,
    /// Assignee login, matched against the assignees JSON list
    pub assignee: Option<String>,
    /// Free-text search over title and body
    pub search: Option<String>,
}

impl IssueFilter {
    fn into_condition(self, repository_id: Uuid) -> Condition {
        let mut cond = Condition::all().add(issue::Column::RepositoryId.eq(repository_id));

        if let Some(state) = self.state {
            cond = cond.add(issue::Column::State.eq(state));
        }

        if let Some(label) = self.label {
            cond = cond.add(Expr::cust_with_values(
                "labels @> ?",
                [Value::Json(Some(Box::new(serde_json::json!([
                    { "name": label }
                ]))))],
            ));
        }

        if let Some(assignee) = self.assignee {
            cond = cond.add(Expr::cust_with_values(
                "assignees @> ?",
                [Value::Json(Some(Box::new(serde_json::json!([
                    { "login": assignee }
                ]))))],
            ));
        }

        if let Some(q) = self.search {
            let pattern = format!("%{}%", q);
            cond = cond.add(
                Condition::any()
                    .add(Expr::cust_with_values("title ILIKE ?", [pattern.clone()]))
                    .add(Expr::cust_with_values("body ILIKE ?", [pattern])),
            );
        }

        cond
    }
}

/// List issues for a repository with filters, newest activity first.
/// Returns the page of rows and the total match count.
pub async fn list_for_repository(
    db: &DatabaseConnection,
    repository_id: Uuid,
    filter: IssueFilter,
    offset: u64,
    limit: u64,
) -> AppResult<(Vec<issue::Model>, u64)> {
    let cond = filter.into_condition(repository_id);

    let total = issue::Entity::find()
        .filter(cond.clone())
        .count(db)
        .await?;

    let rows = issue::Entity::find()
        .filter(cond)
        .order_by_desc(issue::Column::GithubUpdatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;

    Ok((rows, total))
}

/// Find an issue by ID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<issue::Model>> {
    let result = issue::Entity::find_by_id(id).one(db).await?;
    Ok(result)
}

/// Upsert an issue by its natural key (repository_id, number). Returns the
/// stored row.
pub async fn upsert(
    db: &DatabaseConnection,
    repository_id: Uuid,
    write: IssueWrite,
    synced_at: DateTime<Utc>,
) -> AppResult<issue::Model> {
    let existing = issue::Entity::find()
        .filter(issue::Column::RepositoryId.eq(repository_id))
        .filter(issue::Column::Number.eq(write.number))
        .one(db)
        .await?;

    if let Some(m) = existing {
        let mut active: issue::ActiveModel = m.into();
        active.title = Set(write.title);
        active.state = Set(write.state);
        active.body = Set(write.body);
        active.author_login = Set(write.author_login);
        active.author_avatar_url = Set(write.author_avatar_url);
        active.labels = Set(write.labels);
        active.assignees = Set(write.assignees);
        active.comment_count = Set(write.comment_count);
        active.github_created_at = Set(write.github_created_at);
        active.github_updated_at = Set(write.github_updated_at);
        active.cached_at = Set(Some(synced_at));
        active.updated_at = Set(synced_at);
        let updated = active.update(db).await?;
        return Ok(updated);
    }

    let model = issue::ActiveModel {
        id: Set(Uuid::new_v4()),
        repository_id: Set(repository_id),
        number: Set(write.number),
        title: Set(write.title),
        state: Set(write.state),
        body: Set(write.body),
        author_login: Set(write.author_login),
        author_avatar_url: Set(write.author_avatar_url),
        labels: Set(write.labels),
        assignees: Set(write.assignees),
        comment_count: Set(write.comment_count),
        github_created_at: Set(write.github_created_at),
        github_updated_at: Set(write.github_updated_at),
        cached_at: Set(Some(synced_at)),
        created_at: Set(synced_at),
        updated_at: Set(synced_at),
    };

    let inserted = model.insert(db).await?;
    Ok(inserted)
}
