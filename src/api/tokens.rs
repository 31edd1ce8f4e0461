//! GitHub token endpoints.
//!
//! Tokens are scoped per (user, domain). The plaintext crosses the API
//! boundary exactly once, on PUT, and is encrypted before it is stored.

use actix_web::{HttpResponse, delete, get, put, web};
use sea_orm::DatabaseConnection;
use secrecy::ExposeSecret;
use tracing::info;

use crate::auth::SessionUser;
use crate::db::github_tokens;
use crate::error::{AppError, AppResult};
use crate::models::{PutTokenRequest, TokenResponse};
use crate::services::TokenCipher;

/// Configure token routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_tokens)
        .service(put_token)
        .service(delete_token);
}

/// List configured token domains.
///
/// GET /api/v1/tokens
#[utoipa::path(
    get,
    path = "/api/v1/tokens",
    tag = "tokens",
    responses(
        (status = 200, description = "Configured tokens (secrets omitted)", body = Vec<TokenResponse>),
        (status = 401, description = "No valid session", body = crate::error::ErrorResponse),
    )
)]
#[get("/tokens")]
pub async fn list_tokens(
    session: SessionUser,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let tokens = github_tokens::list_for_user(&db, session.user_id).await?;
    let response: Vec<TokenResponse> = tokens.into_iter().map(TokenResponse::from).collect();

    Ok(HttpResponse::Ok().json(response))
}

/// Store or replace the token for a GitHub domain.
///
/// PUT /api/v1/tokens/{domain}
#[utoipa::path(
    put,
    path = "/api/v1/tokens/{domain}",
    tag = "tokens",
    params(("domain" = String, Path, description = "GitHub domain, e.g. github.com")),
    request_body = PutTokenRequest,
    responses(
        (status = 200, description = "Token stored", body = TokenResponse),
        (status = 400, description = "Invalid token or domain", body = crate::error::ErrorResponse),
        (status = 401, description = "No valid session", body = crate::error::ErrorResponse),
    )
)]
#[put("/tokens/{domain}")]
pub async fn put_token(
    session: SessionUser,
    path: web::Path<String>,
    body: web::Json<PutTokenRequest>,
    db: web::Data<DatabaseConnection>,
    cipher: web::Data<TokenCipher>,
) -> AppResult<HttpResponse> {
    let domain = path.into_inner().trim().to_lowercase();
    if domain.is_empty() || domain.contains('/') {
        return Err(AppError::InvalidInput(
            "Domain must be a bare hostname".to_string(),
        ));
    }

    if body.token.expose_secret().trim().is_empty() {
        return Err(AppError::InvalidInput("Token must not be empty".to_string()));
    }

    let ciphertext = cipher.encrypt(&body.token, session.user_id.as_bytes())?;
    let stored = github_tokens::upsert(&db, session.user_id, &domain, &ciphertext).await?;

    info!(user_id = %session.user_id, domain = %domain, "GitHub token stored");

    Ok(HttpResponse::Ok().json(TokenResponse::from(stored)))
}

/// Remove the token for a GitHub domain.
///
/// DELETE /api/v1/tokens/{domain}
#[utoipa::path(
    delete,
    path = "/api/v1/tokens/{domain}",
    tag = "tokens",
    params(("domain" = String, Path, description = "GitHub domain")),
    responses(
        (status = 204, description = "Token removed"),
        (status = 404, description = "No token for this domain", body = crate::error::ErrorResponse),
        (status = 401, description = "No valid session", body = crate::error::ErrorResponse),
    )
)]
#[delete("/tokens/{domain}")]
pub async fn delete_token(
    session: SessionUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let domain = path.into_inner();

    let removed = github_tokens::delete_by_domain(&db, session.user_id, &domain).await?;
    if !removed {
        return Err(AppError::NotFound(format!("Token for domain {}", domain)));
    }

    info!(user_id = %session.user_id, domain = %domain, "GitHub token removed");

    Ok(HttpResponse::NoContent().finish())
}
