//! Database module providing connection setup and query modules.

pub mod assignable_users;
pub mod github_tokens;
pub mod issue_comments;
pub mod issues;
pub mod repositories;
pub mod users;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

use crate::error::AppResult;

/// Connect to PostgreSQL.
pub async fn connect(database_url: &str) -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url.to_string());
    opts.max_connections(10)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(opts).await?;
    Ok(db)
}
