//! Issue and comment models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{issue, issue_comment};
use crate::models::Pagination;

/// A label reference as stored in the issue's labels list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LabelRef {
    pub name: String,
}

/// An assignee reference as stored in the issue's assignees list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssigneeRef {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Query parameters for the issue list.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueListQuery {
    /// Filter by state: 'open' or 'closed'
    pub state: Option<String>,
    /// Filter by label name
    pub label: Option<String>,
    /// Filter by assignee login
    pub assignee: Option<String>,
    /// Free-text search over title and body
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// One issue in a list response.
#[derive(Debug, Serialize, ToSchema)]
pub struct IssueSummary {
    pub id: Uuid,
    pub number: i32,
    pub title: String,
    pub state: String,
    pub author_login: Option<String>,
    pub author_avatar_url: Option<String>,
    pub labels: Vec<LabelRef>,
    pub assignees: Vec<AssigneeRef>,
    pub comment_count: i32,
    pub github_created_at: DateTime<Utc>,
    pub github_updated_at: DateTime<Utc>,
}

impl From<issue::Model> for IssueSummary {
    fn from(m: issue::Model) -> Self {
        Self {
            id: m.id,
            number: m.number,
            title: m.title,
            state: m.state,
            author_login: m.author_login,
            author_avatar_url: m.author_avatar_url,
            labels: serde_json::from_value(m.labels).unwrap_or_default(),
            assignees: serde_json::from_value(m.assignees).unwrap_or_default(),
            comment_count: m.comment_count,
            github_created_at: m.github_created_at,
            github_updated_at: m.github_updated_at,
        }
    }
}

/// Issue list response with pagination.
#[derive(Debug, Serialize, ToSchema)]
pub struct IssueListResponse {
    pub issues: Vec<IssueSummary>,
    pub pagination: Pagination,
}

/// One comment in an issue detail response, in chronological order.
#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: Uuid,
    pub body: Option<String>,
    pub author_login: Option<String>,
    pub author_avatar_url: Option<String>,
    pub github_created_at: DateTime<Utc>,
}

impl From<issue_comment::Model> for CommentResponse {
    fn from(m: issue_comment::Model) -> Self {
        Self {
            id: m.id,
            body: m.body,
            author_login: m.author_login,
            author_avatar_url: m.author_avatar_url,
            github_created_at: m.github_created_at,
        }
    }
}

/// Full issue detail with its comment thread.
#[derive(Debug, Serialize, ToSchema)]
pub struct IssueDetailResponse {
    pub id: Uuid,
    pub repository_id: Uuid,
    pub number: i32,
    pub title: String,
    pub state: String,
    pub body: Option<String>,
    pub author_login: Option<String>,
    pub author_avatar_url: Option<String>,
    pub labels: Vec<LabelRef>,
    pub assignees: Vec<AssigneeRef>,
    pub github_created_at: DateTime<Utc>,
    pub github_updated_at: DateTime<Utc>,
    pub comments: Vec<CommentResponse>,
}

impl IssueDetailResponse {
    /// Assemble the detail from an issue row and its comment rows.
    pub fn from_parts(m: issue::Model, comments: Vec<issue_comment::Model>) -> Self {
        Self {
            id: m.id,
            repository_id: m.repository_id,
            number: m.number,
            title: m.title,
            state: m.state,
            body: m.body,
            author_login: m.author_login,
            author_avatar_url: m.author_avatar_url,
            labels: serde_json::from_value(m.labels).unwrap_or_default(),
            assignees: serde_json::from_value(m.assignees).unwrap_or_default(),
            github_created_at: m.github_created_at,
            github_updated_at: m.github_updated_at,
            comments: comments.into_iter().map(CommentResponse::from).collect(),
        }
    }
}
