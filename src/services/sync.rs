//! Sync reconciler: pulls the current state of a repository from GitHub and
//! merges it into the local cache.
//!
//! Each invocation is one attempt with no internal retry; scheduling and
//! backoff belong to the caller. Per invocation the shape is always the
//! same: resolve the repository (missing row is a hard failure), resolve the
//! owner's token for the repository's domain (missing token is a logged
//! no-op), fetch from GitHub (an upstream error aborts without touching any
//! row), then reconcile with upsert-by-natural-key writes.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use sea_orm::DatabaseConnection;
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ReconcileMode;
use crate::db::{assignable_users, github_tokens, issue_comments, issues, repositories};
use crate::entity::repository;
use crate::error::{AppError, AppResult};
use crate::services::github::{AssignableUser, GithubClient, GithubComment, GithubIssue};
use crate::services::token_cipher::TokenCipher;

/// A cached assignable-user row, as seen by the planning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAssignable {
    pub login: String,
    pub avatar_url: Option<String>,
}

/// The writes one reconciliation pass will perform.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    /// (login, avatar_url) pairs to upsert, in response order.
    pub upserts: Vec<(String, Option<String>)>,
    /// Logins to delete (replace mode only).
    pub deletes: Vec<String>,
    /// Fetched records dropped for having a null or empty login.
    pub skipped_blank: usize,
}

/// Compute the reconciliation writes for one assignable-user response.
///
/// Pure: upstream records with null/blank logins (deleted or unknown
/// accounts) are skipped rather than persisted as placeholders; duplicate
/// logins keep the last avatar seen. In additive mode locally cached logins
/// absent from the response are kept; replace mode schedules them for
/// deletion.
pub fn plan_assignable_users(
    existing: &[CachedAssignable],
    fetched: &[AssignableUser],
    mode: ReconcileMode,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    for record in fetched {
        let login = match record.login.as_deref() {
            Some(l) if !l.trim().is_empty() => l.to_string(),
            _ => {
                plan.skipped_blank += 1;
                continue;
            }
        };

        if let Some(slot) = plan.upserts.iter_mut().find(|(l, _)| *l == login) {
            slot.1 = record.avatar_url.clone();
        } else {
            plan.upserts.push((login, record.avatar_url.clone()));
        }
    }

    if mode == ReconcileMode::Replace {
        plan.deletes = existing
            .iter()
            .filter(|e| !plan.upserts.iter().any(|(l, _)| *l == e.login))
            .map(|e| e.login.clone())
            .collect();
    }

    plan
}

/// Sync service shared between the HTTP handlers and the scheduler.
pub struct SyncService {
    db: DatabaseConnection,
    github: GithubClient,
    cipher: TokenCipher,
    reconcile_mode: ReconcileMode,
    /// Per-repository single-flight gate. Duplicate enqueues of the same
    /// repository serialize here instead of racing.
    repo_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl SyncService {
    /// Create a new sync service.
    pub fn new(
        db: DatabaseConnection,
        github: GithubClient,
        cipher: TokenCipher,
        reconcile_mode: ReconcileMode,
    ) -> Self {
        Self {
            db,
            github,
            cipher,
            reconcile_mode,
            repo_locks: DashMap::new(),
        }
    }

    async fn lock_repository(&self, repository_id: Uuid) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = self
            .repo_locks
            .entry(repository_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        lock.lock_owned().await
    }

    /// Drop the lock entry once nothing holds or waits on it, so the map
    /// does not accumulate entries for deleted repositories. The strong
    /// count is checked under the shard lock, so a concurrent
    /// `lock_repository` either clones the Arc first (count > 1, entry
    /// stays) or creates a fresh entry after removal.
    fn release_lock(&self, repository_id: Uuid) {
        self.repo_locks
            .remove_if(&repository_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Resolve the repository row. A missing row is a hard failure: the job
    /// was scheduled against a specific id, so this indicates a scheduling
    /// bug or a deleted repository.
    async fn resolve_repository(&self, repository_id: Uuid) -> AppResult<repository::Model> {
        repositories::find_by_id(&self.db, repository_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Repository {}", repository_id)))
    }

    /// Resolve and decrypt the owning user's token for the repository's
    /// domain. None means the user has not configured a token yet.
    async fn resolve_token(&self, repo: &repository::Model) -> AppResult<Option<SecretString>> {
        let row =
            github_tokens::find_by_user_and_domain(&self.db, repo.user_id, &repo.github_domain)
                .await?;

        match row {
            Some(row) => {
                let token = self
                    .cipher
                    .decrypt(&row.token_ciphertext, repo.user_id.as_bytes())?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    /// Refresh everything for one repository: metadata, issues, comments,
    /// then the assignable-user index.
    pub async fn sync_all(&self, repository_id: Uuid) -> AppResult<()> {
        self.sync_repository(repository_id).await?;
        self.sync_assignable_users(repository_id).await
    }

    /// Sync repository metadata, issues, and comments.
    pub async fn sync_repository(&self, repository_id: Uuid) -> AppResult<()> {
        let guard = self.lock_repository(repository_id).await;

        let result = self.sync_repository_inner(repository_id).await;
        if let Err(ref e) = result {
            tracing::error!(
                repository_id = %repository_id,
                error = %e,
                "Repository sync failed"
            );
        }

        drop(guard);
        self.release_lock(repository_id);
        result
    }

    async fn sync_repository_inner(&self, repository_id: Uuid) -> AppResult<()> {
        let repo = self.resolve_repository(repository_id).await?;

        let Some(token) = self.resolve_token(&repo).await? else {
            info!(
                repository = %repo.full_name,
                domain = %repo.github_domain,
                "No GitHub token for domain, skipping sync"
            );
            return Ok(());
        };

        // Fetch everything before writing anything, so an upstream error
        // leaves the cache untouched.
        let fetched = self.fetch_repository_data(&token, &repo).await;
        let (meta, issue_list, comment_lists) = match fetched {
            Ok(data) => data,
            Err(AppError::GithubApi(reason)) => {
                warn!(
                    repository = %repo.full_name,
                    reason = %reason,
                    "GitHub returned an error, aborting sync without changes"
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let now = Utc::now();
        let issue_count = issue_list.len() as i32;
        let open_issue_count = issue_list.iter().filter(|i| i.state == "open").count() as i32;

        for (github_issue, comments) in issue_list.iter().zip(comment_lists.iter()) {
            let stored = issues::upsert(
                &self.db,
                repository_id,
                issue_write_from(github_issue),
                now,
            )
            .await?;

            for comment in comments {
                issue_comments::upsert(&self.db, stored.id, comment_write_from(comment), now)
                    .await?;
            }
        }

        repositories::mark_synced(
            &self.db,
            repo,
            &meta.full_name,
            meta.description.as_deref(),
            issue_count,
            open_issue_count,
            now,
        )
        .await?;

        info!(
            repository_id = %repository_id,
            issues = issue_count,
            open = open_issue_count,
            "Repository cache refreshed"
        );

        Ok(())
    }

    async fn fetch_repository_data(
        &self,
        token: &SecretString,
        repo: &repository::Model,
    ) -> AppResult<(
        crate::services::github::GithubRepo,
        Vec<GithubIssue>,
        Vec<Vec<GithubComment>>,
    )> {
        let meta = self
            .github
            .get_repository(token, &repo.github_domain, &repo.owner, &repo.name)
            .await?;

        let issue_list = self
            .github
            .list_issues(token, &repo.github_domain, &repo.owner, &repo.name)
            .await?;

        let mut comment_lists = Vec::with_capacity(issue_list.len());
        for issue in &issue_list {
            // Issues with no comments don't warrant an API call each.
            if issue.comments == 0 {
                comment_lists.push(Vec::new());
                continue;
            }

            let comments = self
                .github
                .list_issue_comments(
                    token,
                    &repo.github_domain,
                    &repo.owner,
                    &repo.name,
                    issue.number,
                )
                .await?;
            comment_lists.push(comments);
        }

        Ok((meta, issue_list, comment_lists))
    }

    /// Sync the assignable-user index for one repository.
    pub async fn sync_assignable_users(&self, repository_id: Uuid) -> AppResult<()> {
        let guard = self.lock_repository(repository_id).await;

        let result = self.sync_assignable_users_inner(repository_id).await;
        if let Err(ref e) = result {
            tracing::error!(
                repository_id = %repository_id,
                error = %e,
                "Assignable-user sync failed"
            );
        }

        drop(guard);
        self.release_lock(repository_id);
        result
    }

    async fn sync_assignable_users_inner(&self, repository_id: Uuid) -> AppResult<()> {
        let repo = self.resolve_repository(repository_id).await?;

        let Some(token) = self.resolve_token(&repo).await? else {
            info!(
                repository = %repo.full_name,
                domain = %repo.github_domain,
                "No GitHub token for domain, skipping assignable-user sync"
            );
            return Ok(());
        };

        let fetched = match self
            .github
            .fetch_assignable_users(&token, &repo.github_domain, &repo.owner, &repo.name)
            .await
        {
            Ok(users) => users,
            Err(AppError::GithubApi(reason)) => {
                warn!(
                    repository = %repo.full_name,
                    reason = %reason,
                    "GitHub returned an error, aborting assignable-user sync without changes"
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let existing: Vec<CachedAssignable> =
            assignable_users::list_for_repository(&self.db, repository_id)
                .await?
                .into_iter()
                .map(|m| CachedAssignable {
                    login: m.login,
                    avatar_url: m.avatar_url,
                })
                .collect();

        let plan = plan_assignable_users(&existing, &fetched, self.reconcile_mode);

        let now = Utc::now();
        for (login, avatar_url) in &plan.upserts {
            assignable_users::upsert(&self.db, repository_id, login, avatar_url.as_deref(), now)
                .await?;
        }

        assignable_users::delete_logins(&self.db, repository_id, &plan.deletes).await?;

        info!(
            repository = %repo.full_name,
            synced = plan.upserts.len(),
            removed = plan.deletes.len(),
            skipped_blank = plan.skipped_blank,
            "Assignable users reconciled"
        );

        Ok(())
    }
}

fn issue_write_from(issue: &GithubIssue) -> issues::IssueWrite {
    issues::IssueWrite {
        number: issue.number,
        title: issue.title.clone(),
        state: issue.state.clone(),
        body: issue.body.clone(),
        author_login: issue.user.as_ref().map(|u| u.login.clone()),
        author_avatar_url: issue.user.as_ref().and_then(|u| u.avatar_url.clone()),
        labels: serde_json::Value::Array(
            issue
                .labels
                .iter()
                .map(|l| serde_json::json!({ "name": l.name }))
                .collect(),
        ),
        assignees: serde_json::Value::Array(
            issue
                .assignees
                .iter()
                .map(|a| serde_json::json!({ "login": a.login, "avatar_url": a.avatar_url }))
                .collect(),
        ),
        comment_count: issue.comments,
        github_created_at: issue.created_at,
        github_updated_at: issue.updated_at,
    }
}

fn comment_write_from(comment: &GithubComment) -> issue_comments::CommentWrite {
    issue_comments::CommentWrite {
        github_id: comment.id,
        body: comment.body.clone(),
        author_login: comment.user.as_ref().map(|u| u.login.clone()),
        author_avatar_url: comment.user.as_ref().and_then(|u| u.avatar_url.clone()),
        github_created_at: comment.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sea_orm::{DatabaseBackend, MockDatabase};
    use secrecy::SecretString;

    use crate::entity::github_token;

    const TEST_KEY: &str = "8f3a2b1c4d5e6f708192a3b4c5d6e7f808192a3b4c5d6e7f808192a3b4c5d6e7";

    fn service(db: DatabaseConnection) -> SyncService {
        SyncService::new(
            db,
            GithubClient::new(),
            TokenCipher::from_hex_key(TEST_KEY).unwrap(),
            ReconcileMode::Additive,
        )
    }

    fn repo_model(user_id: Uuid, domain: &str) -> repository::Model {
        let now = Utc::now();
        repository::Model {
            id: Uuid::new_v4(),
            user_id,
            github_domain: domain.to_string(),
            owner: "acme".to_string(),
            name: "widgets".to_string(),
            full_name: "acme/widgets".to_string(),
            description: None,
            issue_count: 0,
            open_issue_count: 0,
            cached_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn token_model(user_id: Uuid, domain: &str, ciphertext: String) -> github_token::Model {
        let now = Utc::now();
        github_token::Model {
            id: Uuid::new_v4(),
            user_id,
            domain: domain.to_string(),
            token_ciphertext: ciphertext,
            created_at: now,
            updated_at: now,
        }
    }

    /// A repository id with no backing row is a hard failure, before any
    /// GitHub traffic or write.
    #[tokio::test]
    async fn test_sync_missing_repository_propagates_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<repository::Model>::new()])
            .into_connection();
        let svc = service(db);

        let err = svc.sync_assignable_users(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // The lock entry is dropped once the sync finishes.
        assert!(svc.repo_locks.is_empty());
    }

    /// No token for the repository's domain is an expected no-op: Ok, and
    /// nothing else is queried or written (the mock would error on any
    /// further statement).
    #[tokio::test]
    async fn test_sync_without_token_is_a_quiet_noop() {
        let user_id = Uuid::new_v4();
        let repo = repo_model(user_id, "github.com");
        let repo_id = repo.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![repo.clone()]])
            .append_query_results([Vec::<github_token::Model>::new()])
            .append_query_results([vec![repo]])
            .append_query_results([Vec::<github_token::Model>::new()])
            .into_connection();
        let svc = service(db);

        assert!(svc.sync_assignable_users(repo_id).await.is_ok());
        assert!(svc.sync_repository(repo_id).await.is_ok());
    }

    /// A failing upstream fetch aborts the pass without touching any row:
    /// Ok, and no statements beyond the repository and token lookups.
    /// `.invalid` is a reserved TLD, so the request can never resolve.
    #[tokio::test]
    async fn test_sync_upstream_failure_aborts_without_writes() {
        let user_id = Uuid::new_v4();
        let repo = repo_model(user_id, "github.invalid");
        let repo_id = repo.id;

        let cipher = TokenCipher::from_hex_key(TEST_KEY).unwrap();
        let ciphertext = cipher
            .encrypt(
                &SecretString::from("ghp_test_token".to_string()),
                user_id.as_bytes(),
            )
            .unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![repo]])
            .append_query_results([vec![token_model(user_id, "github.invalid", ciphertext)]])
            .into_connection();
        let svc = service(db);

        assert!(svc.sync_assignable_users(repo_id).await.is_ok());
        assert!(svc.repo_locks.is_empty());
    }

    fn fetched(login: Option<&str>, avatar: Option<&str>) -> AssignableUser {
        AssignableUser {
            login: login.map(|s| s.to_string()),
            avatar_url: avatar.map(|s| s.to_string()),
        }
    }

    fn cached(login: &str, avatar: Option<&str>) -> CachedAssignable {
        CachedAssignable {
            login: login.to_string(),
            avatar_url: avatar.map(|s| s.to_string()),
        }
    }

    /// Apply a plan to a cached row set, mimicking the database writes.
    fn apply(existing: &[CachedAssignable], plan: &ReconcilePlan) -> Vec<CachedAssignable> {
        let mut rows = existing.to_vec();

        for (login, avatar) in &plan.upserts {
            if let Some(row) = rows.iter_mut().find(|r| r.login == *login) {
                row.avatar_url = avatar.clone();
            } else {
                rows.push(CachedAssignable {
                    login: login.clone(),
                    avatar_url: avatar.clone(),
                });
            }
        }

        rows.retain(|r| !plan.deletes.contains(&r.login));
        rows
    }

    #[test]
    fn test_blank_and_null_logins_skipped() {
        let response = vec![
            fetched(Some("alice"), Some("https://example.com/a.png")),
            fetched(Some(""), Some("https://example.com/x.png")),
            fetched(None, None),
        ];

        let plan = plan_assignable_users(&[], &response, ReconcileMode::Additive);

        assert_eq!(plan.upserts.len(), 1);
        assert_eq!(plan.upserts[0].0, "alice");
        assert_eq!(plan.skipped_blank, 2);
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn test_additive_keeps_locally_known_logins() {
        let existing = vec![
            cached("alice", Some("old-a")),
            cached("bob", Some("old-b")),
            cached("carol", None),
        ];
        let response = vec![fetched(Some("alice"), Some("new-a"))];

        let plan = plan_assignable_users(&existing, &response, ReconcileMode::Additive);
        let rows = apply(&existing, &plan);

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows.iter().find(|r| r.login == "alice").unwrap().avatar_url,
            Some("new-a".to_string())
        );
        assert_eq!(
            rows.iter().find(|r| r.login == "bob").unwrap().avatar_url,
            Some("old-b".to_string())
        );
        assert!(rows.iter().any(|r| r.login == "carol"));
    }

    #[test]
    fn test_replace_deletes_absent_logins() {
        let existing = vec![
            cached("alice", Some("old-a")),
            cached("bob", Some("old-b")),
            cached("carol", None),
        ];
        let response = vec![fetched(Some("alice"), Some("new-a"))];

        let plan = plan_assignable_users(&existing, &response, ReconcileMode::Replace);
        let rows = apply(&existing, &plan);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].login, "alice");
        assert_eq!(rows[0].avatar_url, Some("new-a".to_string()));

        let mut deletes = plan.deletes.clone();
        deletes.sort();
        assert_eq!(deletes, vec!["bob".to_string(), "carol".to_string()]);
    }

    #[test]
    fn test_reconciliation_is_idempotent() {
        let response = vec![
            fetched(Some("alice"), Some("a.png")),
            fetched(Some("bob"), None),
        ];

        let first_plan = plan_assignable_users(&[], &response, ReconcileMode::Additive);
        let after_first = apply(&[], &first_plan);

        let second_plan =
            plan_assignable_users(&after_first, &response, ReconcileMode::Additive);
        let after_second = apply(&after_first, &second_plan);

        assert_eq!(after_first, after_second);
        assert_eq!(after_second.len(), 2);
    }

    #[test]
    fn test_duplicate_logins_keep_last_avatar() {
        let response = vec![
            fetched(Some("alice"), Some("first.png")),
            fetched(Some("alice"), Some("second.png")),
        ];

        let plan = plan_assignable_users(&[], &response, ReconcileMode::Additive);

        assert_eq!(plan.upserts.len(), 1);
        assert_eq!(plan.upserts[0].1, Some("second.png".to_string()));
    }

    #[test]
    fn test_empty_response_in_replace_mode_clears_index() {
        let existing = vec![cached("alice", None)];

        let plan = plan_assignable_users(&existing, &[], ReconcileMode::Replace);

        assert!(plan.upserts.is_empty());
        assert_eq!(plan.deletes, vec!["alice".to_string()]);
    }
}
