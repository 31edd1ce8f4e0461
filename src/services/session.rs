//! Session routes and JWT helpers for web UI authentication.
//!
//! Sessions are HS256 JWTs carried in the `deck_session` HttpOnly cookie.
//! There is no password store; in development a user signs in by email via
//! `POST /auth/dev-login`, which upserts the user row and issues a session.
//!
//! Endpoints:
//! 1. POST /auth/dev-login — Issue a session for an email (development only)
//! 2. GET /auth/me — Return the current user from the session
//! 3. POST /auth/logout — Clear the session cookie

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpResponse, get, post, web};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::DatabaseConnection;
use tracing::info;
use uuid::Uuid;

use crate::auth::SessionUser;
use crate::config::{Config, SESSION_COOKIE};
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::models::UserResponse;

/// Session JWT issuer.
pub const SESSION_ISSUER: &str = "issuedeck";
/// Session lifetime in seconds (24 hours).
const SESSION_TTL_SECS: u64 = 86400;

/// Claims carried in the session JWT.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
    pub email: String,
}

/// Configure session routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(dev_login)
        .service(get_current_user)
        .service(logout);
}

/// Create a session JWT for a user.
pub fn create_session_token(user_id: Uuid, email: &str, secret: &str) -> AppResult<String> {
    let now = chrono::Utc::now();
    let exp = now + chrono::Duration::seconds(SESSION_TTL_SECS as i64);

    let claims = SessionClaims {
        sub: user_id.to_string(),
        iss: SESSION_ISSUER.to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
        email: email.to_string(),
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| AppError::InvalidInput(format!("Failed to create session token: {}", e)))
}

/// Verify a session JWT and return its claims.
pub fn verify_session_token(token: &str, secret: &str) -> Result<SessionClaims, String> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation.validate_aud = false;

    let token_data = decode::<SessionClaims>(token, &key, &validation)
        .map_err(|e| format!("Invalid session token: {}", e))?;

    Ok(token_data.claims)
}

fn session_cookie(token: String, is_production: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(is_production);
    cookie
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct DevLoginRequest {
    /// Email address to sign in as
    pub email: String,
}

/// Sign in by email. Development environments only.
///
/// POST /api/v1/auth/dev-login
#[utoipa::path(
    post,
    path = "/api/v1/auth/dev-login",
    tag = "auth",
    request_body = DevLoginRequest,
    responses(
        (status = 200, description = "Session issued", body = UserResponse),
        (status = 400, description = "Invalid email or not in development mode", body = crate::error::ErrorResponse),
    )
)]
#[post("/auth/dev-login")]
pub async fn dev_login(
    body: web::Json<DevLoginRequest>,
    config: web::Data<Config>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    if !config.is_development() {
        return Err(AppError::InvalidInput(
            "dev-login is only available in development mode".to_string(),
        ));
    }

    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidInput(
            "A valid email address is required".to_string(),
        ));
    }

    let user = users::find_or_create_by_email(&db, &email).await?;
    let token = create_session_token(user.id, &user.email, &config.session_secret)?;

    info!(user_id = %user.id, "Development session issued");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(token, config.environment.is_production()))
        .json(UserResponse::from(user)))
}

/// Return the current user.
///
/// GET /api/v1/auth/me
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "No valid session", body = crate::error::ErrorResponse),
    )
)]
#[get("/auth/me")]
pub async fn get_current_user(
    session: SessionUser,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let user = users::find_by_id(&db, session.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session user no longer exists".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Clear the session cookie.
///
/// POST /api/v1/auth/logout
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    responses((status = 204, description = "Session cleared")),
)]
#[post("/auth/logout")]
pub async fn logout(config: web::Data<Config>) -> HttpResponse {
    let mut cookie = session_cookie(String::new(), config.environment.is_production());
    cookie.make_removal();

    HttpResponse::NoContent().cookie(cookie).finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_round_trip() {
        let user_id = Uuid::new_v4();
        let token = create_session_token(user_id, "dev@example.com", "secret").unwrap();

        let claims = verify_session_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "dev@example.com");
        assert_eq!(claims.iss, SESSION_ISSUER);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_session_token(Uuid::new_v4(), "dev@example.com", "secret").unwrap();
        assert!(verify_session_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_session_token("not-a-jwt", "secret").is_err());
    }
}
