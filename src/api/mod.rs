//! API endpoint modules.

pub mod health;
pub mod issues;
pub mod openapi;
pub mod repositories;
pub mod tokens;

pub use health::configure_health_routes;
pub use issues::configure_routes as configure_issue_routes;
pub use openapi::ApiDoc;
pub use repositories::configure_routes as configure_repository_routes;
pub use tokens::configure_routes as configure_token_routes;
