//! Repository models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{repository, repository_assignable_user};
use crate::services::freshness::{FreshnessPolicy, freshness_in_words};

/// Request to register a repository for tracking.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRepositoryRequest {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
    /// GitHub domain; defaults to the server-wide default when omitted
    pub github_domain: Option<String>,
}

/// A tracked repository with cache freshness info.
#[derive(Debug, Serialize, ToSchema)]
pub struct RepositoryResponse {
    pub id: Uuid,
    pub github_domain: String,
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub issue_count: i32,
    pub open_issue_count: i32,
    /// When the cache was last refreshed; null if never synced
    pub cached_at: Option<DateTime<Utc>>,
    /// Human-readable freshness, e.g. "3 minutes ago" or "Never synced"
    pub freshness: String,
    /// Whether the cache is older than the freshness window
    pub stale: bool,
}

impl RepositoryResponse {
    /// Build a response, evaluating freshness against the given policy.
    pub fn from_model(
        m: repository::Model,
        policy: &FreshnessPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: m.id,
            github_domain: m.github_domain,
            owner: m.owner,
            name: m.name,
            full_name: m.full_name,
            description: m.description,
            issue_count: m.issue_count,
            open_issue_count: m.open_issue_count,
            cached_at: m.cached_at,
            freshness: freshness_in_words(m.cached_at, now),
            stale: policy.is_stale(m.cached_at, now),
        }
    }
}

/// Query parameters for assignable-user autocomplete.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignableUserSearchQuery {
    /// Substring to match against logins; empty returns the full index
    pub q: Option<String>,
}

/// One cached assignable user.
#[derive(Debug, Serialize, ToSchema)]
pub struct AssignableUserResponse {
    pub login: String,
    pub avatar_url: Option<String>,
}

impl From<repository_assignable_user::Model> for AssignableUserResponse {
    fn from(m: repository_assignable_user::Model) -> Self {
        Self {
            login: m.login,
            avatar_url: m.avatar_url,
        }
    }
}
