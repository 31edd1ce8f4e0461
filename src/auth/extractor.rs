//! Actix-web extractor for session authentication.
//!
//! The session is an HS256 JWT carried in the `deck_session` HttpOnly
//! cookie, with an `Authorization: Bearer` fallback for non-browser clients.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use uuid::Uuid;

use crate::config::{Config, SESSION_COOKIE};
use crate::error::ErrorResponse;
use crate::services::session::verify_session_token;

/// Authentication error for extractors.
#[derive(Debug)]
pub struct AuthError {
    message: String,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::UNAUTHORIZED).json(ErrorResponse {
            error: "UNAUTHORIZED".to_string(),
            message: self.message.clone(),
        })
    }
}

/// Extract the session token from the cookie or the Authorization header.
fn extract_session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Extractor that requires a valid session.
///
/// Use this in handlers that require authentication:
/// ```ignore
/// async fn protected_handler(session: SessionUser) -> impl Responder {
///     // session.user_id identifies the signed-in user
/// }
/// ```
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
}

impl FromRequest for SessionUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let config = match req.app_data::<web::Data<Config>>() {
            Some(config) => config,
            None => {
                return ready(Err(AuthError {
                    message: "Internal configuration error".to_string(),
                }));
            }
        };

        let token = match extract_session_token(req) {
            Some(token) => token,
            None => {
                return ready(Err(AuthError {
                    message: "Missing session. Sign in first.".to_string(),
                }));
            }
        };

        let claims = match verify_session_token(&token, &config.session_secret) {
            Ok(claims) => claims,
            Err(message) => return ready(Err(AuthError { message })),
        };

        let user_id = match Uuid::parse_str(&claims.sub) {
            Ok(id) => id,
            Err(_) => {
                return ready(Err(AuthError {
                    message: "Invalid session token".to_string(),
                }));
            }
        };

        ready(Ok(SessionUser {
            user_id,
            email: claims.email,
        }))
    }
}
