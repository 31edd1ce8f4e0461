//! Repository endpoints: registration, listing, sync, issues, and the
//! assignable-user autocomplete.
//!
//! List and detail views serve whatever is cached and, when the cache is
//! stale, kick off a background refresh rather than blocking the response.
//! `POST /repositories/{id}/sync` is the explicit, blocking refresh.

use actix_web::{HttpResponse, delete, get, post, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use tracing::debug;
use uuid::Uuid;

use crate::auth::SessionUser;
use crate::config::Config;
use crate::db::{assignable_users, issues, repositories};
use crate::error::{AppError, AppResult};
use crate::models::{
    AssignableUserResponse, AssignableUserSearchQuery, CreateRepositoryRequest, IssueListQuery,
    IssueListResponse, IssueSummary, Pagination, RepositoryResponse,
};
use crate::services::{FreshnessPolicy, SyncService};

/// Maximum rows returned by the assignable-user autocomplete.
const AUTOCOMPLETE_LIMIT: u64 = 20;

/// Configure repository routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_repository)
        .service(list_repositories)
        .service(get_repository)
        .service(delete_repository)
        .service(sync_repository)
        .service(list_issues)
        .service(search_assignable_users);
}

/// Spawn a background refresh for one repository. Failures are logged by the
/// sync service itself.
fn spawn_sync(sync: &web::Data<SyncService>, repository_id: Uuid) {
    let sync = sync.clone().into_inner();
    tokio::spawn(async move {
        let _ = sync.sync_all(repository_id).await;
    });
}

/// Resolve a repository owned by the session user or 404.
async fn owned_repository(
    db: &DatabaseConnection,
    id: Uuid,
    session: &SessionUser,
) -> AppResult<crate::entity::repository::Model> {
    repositories::find_by_id_for_user(db, id, session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Repository {}", id)))
}

/// Register a repository for tracking.
///
/// POST /api/v1/repositories
#[utoipa::path(
    post,
    path = "/api/v1/repositories",
    tag = "repositories",
    request_body = CreateRepositoryRequest,
    responses(
        (status = 201, description = "Repository registered; first sync started", body = RepositoryResponse),
        (status = 400, description = "Invalid or duplicate repository", body = crate::error::ErrorResponse),
        (status = 401, description = "No valid session", body = crate::error::ErrorResponse),
    )
)]
#[post("/repositories")]
pub async fn create_repository(
    session: SessionUser,
    body: web::Json<CreateRepositoryRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    sync: web::Data<SyncService>,
) -> AppResult<HttpResponse> {
    let owner = body.owner.trim();
    let name = body.name.trim();
    if owner.is_empty() || name.is_empty() {
        return Err(AppError::InvalidInput(
            "Owner and name are required".to_string(),
        ));
    }
    if owner.contains('/') || name.contains('/') {
        return Err(AppError::InvalidInput(
            "Owner and name must not contain '/'".to_string(),
        ));
    }

    let domain = body
        .github_domain
        .as_deref()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| config.default_github_domain.clone());

    let repo = repositories::insert(&db, session.user_id, &domain, owner, name).await?;

    // First sync runs in the background; the row starts out "Never synced".
    spawn_sync(&sync, repo.id);

    let policy = FreshnessPolicy::new(config.cache_ttl_secs);
    Ok(HttpResponse::Created().json(RepositoryResponse::from_model(repo, &policy, Utc::now())))
}

/// List tracked repositories with freshness labels.
///
/// GET /api/v1/repositories
#[utoipa::path(
    get,
    path = "/api/v1/repositories",
    tag = "repositories",
    responses(
        (status = 200, description = "Tracked repositories", body = Vec<RepositoryResponse>),
        (status = 401, description = "No valid session", body = crate::error::ErrorResponse),
    )
)]
#[get("/repositories")]
pub async fn list_repositories(
    session: SessionUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    sync: web::Data<SyncService>,
) -> AppResult<HttpResponse> {
    let repos = repositories::list_for_user(&db, session.user_id).await?;

    let policy = FreshnessPolicy::new(config.cache_ttl_secs);
    let now = Utc::now();

    let mut response = Vec::with_capacity(repos.len());
    for repo in repos {
        if policy.is_stale(repo.cached_at, now) {
            debug!(repository_id = %repo.id, "Stale cache viewed, refreshing in background");
            spawn_sync(&sync, repo.id);
        }
        response.push(RepositoryResponse::from_model(repo, &policy, now));
    }

    Ok(HttpResponse::Ok().json(response))
}

/// Get one tracked repository.
///
/// GET /api/v1/repositories/{id}
#[utoipa::path(
    get,
    path = "/api/v1/repositories/{id}",
    tag = "repositories",
    params(("id" = Uuid, Path, description = "Repository ID")),
    responses(
        (status = 200, description = "Repository", body = RepositoryResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    )
)]
#[get("/repositories/{id}")]
pub async fn get_repository(
    session: SessionUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    sync: web::Data<SyncService>,
) -> AppResult<HttpResponse> {
    let repo = owned_repository(&db, path.into_inner(), &session).await?;

    let policy = FreshnessPolicy::new(config.cache_ttl_secs);
    let now = Utc::now();

    if policy.is_stale(repo.cached_at, now) {
        spawn_sync(&sync, repo.id);
    }

    Ok(HttpResponse::Ok().json(RepositoryResponse::from_model(repo, &policy, now)))
}

/// Stop tracking a repository. Cached issues, comments, and assignable
/// users are removed with it.
///
/// DELETE /api/v1/repositories/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/repositories/{id}",
    tag = "repositories",
    params(("id" = Uuid, Path, description = "Repository ID")),
    responses(
        (status = 204, description = "Repository removed"),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    )
)]
#[delete("/repositories/{id}")]
pub async fn delete_repository(
    session: SessionUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let repo = owned_repository(&db, path.into_inner(), &session).await?;
    repositories::delete(&db, repo.id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Force a cache refresh, waiting for it to complete.
///
/// A missing token or an upstream GitHub failure leaves the cache as-is and
/// still returns 200; the response's `cached_at` and `stale` fields show
/// whether the refresh actually advanced.
///
/// POST /api/v1/repositories/{id}/sync
#[utoipa::path(
    post,
    path = "/api/v1/repositories/{id}/sync",
    tag = "repositories",
    params(("id" = Uuid, Path, description = "Repository ID")),
    responses(
        (status = 200, description = "Repository after the refresh attempt; check `cached_at`/`stale` for the outcome", body = RepositoryResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    )
)]
#[post("/repositories/{id}/sync")]
pub async fn sync_repository(
    session: SessionUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    sync: web::Data<SyncService>,
) -> AppResult<HttpResponse> {
    let repo = owned_repository(&db, path.into_inner(), &session).await?;

    sync.sync_all(repo.id).await?;

    // Reload: the sync updated counts and cached_at.
    let refreshed = owned_repository(&db, repo.id, &session).await?;

    let policy = FreshnessPolicy::new(config.cache_ttl_secs);
    Ok(HttpResponse::Ok().json(RepositoryResponse::from_model(
        refreshed,
        &policy,
        Utc::now(),
    )))
}

/// List cached issues with filters.
///
/// GET /api/v1/repositories/{id}/issues
#[utoipa::path(
    get,
    path = "/api/v1/repositories/{id}/issues",
    tag = "issues",
    params(
        ("id" = Uuid, Path, description = "Repository ID"),
        ("state" = Option<String>, Query, description = "Filter by state: open or closed"),
        ("label" = Option<String>, Query, description = "Filter by label name"),
        ("assignee" = Option<String>, Query, description = "Filter by assignee login"),
        ("search" = Option<String>, Query, description = "Free-text search over title and body"),
        ("page" = Option<u32>, Query, description = "Page number (1-based)"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
    ),
    responses(
        (status = 200, description = "Cached issues", body = IssueListResponse),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    )
)]
#[get("/repositories/{id}/issues")]
pub async fn list_issues(
    session: SessionUser,
    path: web::Path<Uuid>,
    query: web::Query<IssueListQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    sync: web::Data<SyncService>,
) -> AppResult<HttpResponse> {
    let repo = owned_repository(&db, path.into_inner(), &session).await?;
    let query = query.into_inner();

    if let Some(ref state) = query.state {
        if state != "open" && state != "closed" {
            return Err(AppError::InvalidInput(
                "state must be 'open' or 'closed'".to_string(),
            ));
        }
    }

    let policy = FreshnessPolicy::new(config.cache_ttl_secs);
    if policy.is_stale(repo.cached_at, Utc::now()) {
        spawn_sync(&sync, repo.id);
    }

    let pagination = crate::models::PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    let page = pagination.page();
    let limit = pagination.clamped_limit();

    let filter = issues::IssueFilter {
        state: query.state,
        label: query.label,
        assignee: query.assignee,
        search: query.search,
    };

    let (rows, total) = issues::list_for_repository(
        &db,
        repo.id,
        filter,
        pagination.offset(),
        limit as u64,
    )
    .await?;

    Ok(HttpResponse::Ok().json(IssueListResponse {
        issues: rows.into_iter().map(IssueSummary::from).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// Autocomplete over the cached assignable-user index.
///
/// GET /api/v1/repositories/{id}/assignable-users
#[utoipa::path(
    get,
    path = "/api/v1/repositories/{id}/assignable-users",
    tag = "repositories",
    params(
        ("id" = Uuid, Path, description = "Repository ID"),
        ("q" = Option<String>, Query, description = "Login substring to match"),
    ),
    responses(
        (status = 200, description = "Matching assignable users", body = Vec<AssignableUserResponse>),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    )
)]
#[get("/repositories/{id}/assignable-users")]
pub async fn search_assignable_users(
    session: SessionUser,
    path: web::Path<Uuid>,
    query: web::Query<AssignableUserSearchQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    sync: web::Data<SyncService>,
) -> AppResult<HttpResponse> {
    let repo = owned_repository(&db, path.into_inner(), &session).await?;

    let policy = FreshnessPolicy::new(config.cache_ttl_secs);
    if policy.is_stale(repo.cached_at, Utc::now()) {
        spawn_sync(&sync, repo.id);
    }

    let rows = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => assignable_users::search(&db, repo.id, q, AUTOCOMPLETE_LIMIT).await?,
        None => assignable_users::list_for_repository(&db, repo.id).await?,
    };

    let response: Vec<AssignableUserResponse> = rows
        .into_iter()
        .map(AssignableUserResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(response))
}
