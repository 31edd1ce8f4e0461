//! Issue detail endpoint.

use actix_web::{HttpResponse, get, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::SessionUser;
use crate::db::{issue_comments, issues, repositories};
use crate::error::{AppError, AppResult};
use crate::models::IssueDetailResponse;

/// Configure issue routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_issue);
}

/// Get a cached issue with its comment thread in chronological order.
///
/// GET /api/v1/issues/{id}
#[utoipa::path(
    get,
    path = "/api/v1/issues/{id}",
    tag = "issues",
    params(("id" = Uuid, Path, description = "Issue ID")),
    responses(
        (status = 200, description = "Issue detail", body = IssueDetailResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 401, description = "No valid session", body = crate::error::ErrorResponse),
    )
)]
#[get("/issues/{id}")]
pub async fn get_issue(
    session: SessionUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let issue = issues::find_by_id(&db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Issue {}", id)))?;

    // Ownership check through the parent repository.
    repositories::find_by_id_for_user(&db, issue.repository_id, session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Issue {}", id)))?;

    let comments = issue_comments::list_for_issue(&db, issue.id).await?;

    Ok(HttpResponse::Ok().json(IssueDetailResponse::from_parts(issue, comments)))
}
