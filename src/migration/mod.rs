//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_github_tokens;
mod m20260301_000003_create_repositories;
mod m20260301_000004_create_issues;
mod m20260301_000005_create_issue_comments;
mod m20260301_000006_create_repository_assignable_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_github_tokens::Migration),
            Box::new(m20260301_000003_create_repositories::Migration),
            Box::new(m20260301_000004_create_issues::Migration),
            Box::new(m20260301_000005_create_issue_comments::Migration),
            Box::new(m20260301_000006_create_repository_assignable_users::Migration),
        ]
    }
}
