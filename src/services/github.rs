//! GitHub API client for fetching repositories, issues, comments, and
//! assignable users.
//!
//! REST is used for repository metadata, issues, and comments; the
//! assignable-user set only exists as a GraphQL connection. Supports
//! github.com and GitHub Enterprise domains. Every call is authenticated
//! with a personal access token resolved per (user, domain).

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// HTTP connect timeout for GitHub API calls.
const HTTP_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
/// HTTP total timeout for GitHub API calls.
const HTTP_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
/// REST page size (GitHub maximum).
const REST_PAGE_SIZE: usize = 100;
/// GraphQL connection page size.
const GRAPHQL_PAGE_SIZE: usize = 100;

/// GraphQL query for the assignable-user connection.
const ASSIGNABLE_USERS_QUERY: &str = r#"
query($owner: String!, $name: String!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    assignableUsers(first: 100, after: $cursor) {
      nodes { login avatarUrl }
      pageInfo { hasNextPage endCursor }
    }
  }
}
"#;

/// GitHub API client.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
}

/// Resolve the REST API base URL for a GitHub domain.
pub fn rest_base(domain: &str) -> String {
    if domain == "github.com" {
        "https://api.github.com".to_string()
    } else {
        format!("https://{}/api/v3", domain)
    }
}

/// Resolve the GraphQL endpoint URL for a GitHub domain.
pub fn graphql_url(domain: &str) -> String {
    if domain == "github.com" {
        "https://api.github.com/graphql".to_string()
    } else {
        format!("https://{}/api/graphql", domain)
    }
}

impl GithubClient {
    /// Create a new client with timeouts.
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .user_agent(concat!("issuedeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client for GitHub");

        Self { http }
    }

    /// Get repository metadata.
    pub async fn get_repository(
        &self,
        token: &SecretString,
        domain: &str,
        owner: &str,
        name: &str,
    ) -> AppResult<GithubRepo> {
        let url = format!("{}/repos/{}/{}", rest_base(domain), owner, name);
        self.get_json(&url, token, &[]).await
    }

    /// List all issues for a repository (open and closed), paginated.
    ///
    /// The REST issues endpoint also returns pull requests; entries carrying
    /// a `pull_request` key are filtered out here.
    pub async fn list_issues(
        &self,
        token: &SecretString,
        domain: &str,
        owner: &str,
        name: &str,
    ) -> AppResult<Vec<GithubIssue>> {
        let url = format!("{}/repos/{}/{}/issues", rest_base(domain), owner, name);
        let mut issues = Vec::new();
        let mut page = 1u32;

        loop {
            let batch: Vec<GithubIssue> = self
                .get_json(
                    &url,
                    token,
                    &[
                        ("state", "all".to_string()),
                        ("per_page", REST_PAGE_SIZE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;

            let batch_len = batch.len();
            issues.extend(batch.into_iter().filter(|i| !i.is_pull_request()));

            if batch_len < REST_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(issues)
    }

    /// List all comments for one issue, paginated.
    pub async fn list_issue_comments(
        &self,
        token: &SecretString,
        domain: &str,
        owner: &str,
        name: &str,
        issue_number: i32,
    ) -> AppResult<Vec<GithubComment>> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            rest_base(domain),
            owner,
            name,
            issue_number
        );
        let mut comments = Vec::new();
        let mut page = 1u32;

        loop {
            let batch: Vec<GithubComment> = self
                .get_json(
                    &url,
                    token,
                    &[
                        ("per_page", REST_PAGE_SIZE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;

            let batch_len = batch.len();
            comments.extend(batch);

            if batch_len < REST_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(comments)
    }

    /// Fetch the current assignable-user set via the GraphQL connection,
    /// following cursors until exhausted.
    pub async fn fetch_assignable_users(
        &self,
        token: &SecretString,
        domain: &str,
        owner: &str,
        name: &str,
    ) -> AppResult<Vec<AssignableUser>> {
        let url = graphql_url(domain);
        let mut users = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = serde_json::json!({
                "query": ASSIGNABLE_USERS_QUERY,
                "variables": { "owner": owner, "name": name, "cursor": cursor },
            });

            let response = self
                .http
                .post(&url)
                .bearer_auth(token.expose_secret())
                .json(&body)
                .send()
                .await
                .map_err(|e| AppError::GithubApi(e.to_string()))?;

            let envelope: GraphqlEnvelope = self.check_response_json(response).await?;
            let connection = envelope.into_connection()?;

            users.extend(connection.nodes.into_iter().flatten());

            if connection.page_info.has_next_page {
                cursor = connection.page_info.end_cursor;
                // GitHub always sends a cursor alongside hasNextPage; treat a
                // missing one as end-of-connection rather than looping forever.
                if cursor.is_none() {
                    break;
                }
                if users.len() >= GRAPHQL_PAGE_SIZE * 100 {
                    return Err(AppError::GithubApi(
                        "assignableUsers pagination exceeded 10000 entries".to_string(),
                    ));
                }
            } else {
                break;
            }
        }

        Ok(users)
    }

    /// Generic authenticated GET with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        token: &SecretString,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .header("Accept", "application/vnd.github+json")
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::GithubApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::GithubApi("token unauthorized (401)".to_string()));
            }

            if status.as_u16() == 403 || status.as_u16() == 429 {
                tracing::warn!("GitHub rate limit or forbidden ({})", status);
                return Err(AppError::GithubApi(format!(
                    "rate limited or forbidden ({})",
                    status
                )));
            }

            return Err(AppError::GithubApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::GithubApi(format!("JSON parse error: {}", e)))
    }
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Response types ─────────────────────────────────────────────────────────

/// Repository metadata from the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubRepo {
    pub full_name: String,
    pub description: Option<String>,
}

/// An account reference (issue author, assignee, comment author).
#[derive(Debug, Clone, Deserialize)]
pub struct GithubAccount {
    pub login: String,
    pub avatar_url: Option<String>,
}

/// A label on an issue.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubLabel {
    pub name: String,
}

/// An issue from the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubIssue {
    pub number: i32,
    pub title: String,
    pub state: String,
    pub body: Option<String>,
    pub user: Option<GithubAccount>,
    #[serde(default)]
    pub labels: Vec<GithubLabel>,
    #[serde(default)]
    pub assignees: Vec<GithubAccount>,
    pub comments: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present when the entry is actually a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl GithubIssue {
    /// The REST issues endpoint mixes in pull requests.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// An issue comment from the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubComment {
    pub id: i64,
    pub body: Option<String>,
    pub user: Option<GithubAccount>,
    pub created_at: DateTime<Utc>,
}

/// One node of the assignableUsers connection. The login can be null for
/// deleted accounts.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignableUser {
    pub login: Option<String>,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
}

// ─── GraphQL envelope ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope {
    data: Option<GraphqlData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
    repository: Option<GraphqlRepository>,
}

#[derive(Debug, Deserialize)]
struct GraphqlRepository {
    #[serde(rename = "assignableUsers")]
    assignable_users: AssignableUserConnection,
}

#[derive(Debug, Deserialize)]
struct AssignableUserConnection {
    /// Nodes may be null for deleted accounts.
    nodes: Vec<Option<AssignableUser>>,
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

impl GraphqlEnvelope {
    /// Unwrap the envelope, mapping GraphQL-level errors and a missing
    /// repository to the upstream-error marker.
    fn into_connection(self) -> AppResult<AssignableUserConnection> {
        if let Some(err) = self.errors.first() {
            return Err(AppError::GithubApi(err.message.clone()));
        }

        self.data
            .and_then(|d| d.repository)
            .map(|r| r.assignable_users)
            .ok_or_else(|| {
                AppError::GithubApi("repository not found or not accessible".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_base_for_domains() {
        assert_eq!(rest_base("github.com"), "https://api.github.com");
        assert_eq!(
            rest_base("github.example.com"),
            "https://github.example.com/api/v3"
        );
        assert_eq!(graphql_url("github.com"), "https://api.github.com/graphql");
        assert_eq!(
            graphql_url("github.example.com"),
            "https://github.example.com/api/graphql"
        );
    }

    #[test]
    fn test_issue_deserialization_detects_pull_requests() {
        let issue: GithubIssue = serde_json::from_value(serde_json::json!({
            "number": 42,
            "title": "Crash on startup",
            "state": "open",
            "body": "Stack trace attached",
            "user": { "login": "alice", "avatar_url": "https://example.com/a.png" },
            "labels": [{ "name": "bug" }, { "name": "p1" }],
            "assignees": [{ "login": "bob", "avatar_url": null }],
            "comments": 3,
            "created_at": "2026-01-02T03:04:05Z",
            "updated_at": "2026-01-03T03:04:05Z"
        }))
        .unwrap();
        assert!(!issue.is_pull_request());
        assert_eq!(issue.labels.len(), 2);
        assert_eq!(issue.labels[0].name, "bug");

        let pr: GithubIssue = serde_json::from_value(serde_json::json!({
            "number": 43,
            "title": "Fix crash",
            "state": "open",
            "body": null,
            "user": null,
            "comments": 0,
            "created_at": "2026-01-02T03:04:05Z",
            "updated_at": "2026-01-03T03:04:05Z",
            "pull_request": { "url": "https://api.github.com/repos/o/r/pulls/43" }
        }))
        .unwrap();
        assert!(pr.is_pull_request());
    }

    #[test]
    fn test_graphql_envelope_success() {
        let envelope: GraphqlEnvelope = serde_json::from_value(serde_json::json!({
            "data": {
                "repository": {
                    "assignableUsers": {
                        "nodes": [
                            { "login": "alice", "avatarUrl": "https://example.com/a.png" },
                            null,
                            { "login": null, "avatarUrl": null }
                        ],
                        "pageInfo": { "hasNextPage": false, "endCursor": null }
                    }
                }
            }
        }))
        .unwrap();

        let connection = envelope.into_connection().unwrap();
        assert_eq!(connection.nodes.len(), 3);
        assert!(!connection.page_info.has_next_page);
    }

    #[test]
    fn test_graphql_envelope_error_marker() {
        let envelope: GraphqlEnvelope = serde_json::from_value(serde_json::json!({
            "data": null,
            "errors": [{ "message": "API rate limit exceeded" }]
        }))
        .unwrap();

        let err = envelope.into_connection().unwrap_err();
        assert!(matches!(err, AppError::GithubApi(ref m) if m.contains("rate limit")));
    }

    #[test]
    fn test_graphql_envelope_missing_repository() {
        let envelope: GraphqlEnvelope = serde_json::from_value(serde_json::json!({
            "data": { "repository": null }
        }))
        .unwrap();

        assert!(envelope.into_connection().is_err());
    }
}
