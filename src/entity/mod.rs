//! SeaORM entity definitions for PostgreSQL database.

pub mod github_token;
pub mod issue;
pub mod issue_comment;
pub mod repository;
pub mod repository_assignable_user;
pub mod user;
