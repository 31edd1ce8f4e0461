//! GitHub token models.
//!
//! Token plaintext never appears in a response; the API only reports which
//! domains have a token configured and when it was last updated.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::entity::github_token;

/// Request to store or replace a token for a GitHub domain.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PutTokenRequest {
    /// Personal access token plaintext. Encrypted at rest; never returned.
    #[schema(value_type = String)]
    pub token: SecretString,
}

/// A configured token, with the secret omitted.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct TokenResponse {
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<github_token::Model> for TokenResponse {
    fn from(t: github_token::Model) -> Self {
        Self {
            domain: t.domain,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}
