//! Migration: Create repositories table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE repositories (
                    id UUID PRIMARY KEY,
                    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    github_domain VARCHAR(255) NOT NULL,
                    owner VARCHAR(255) NOT NULL,
                    name VARCHAR(255) NOT NULL,
                    full_name VARCHAR(512) NOT NULL,
                    description TEXT,
                    issue_count INTEGER NOT NULL DEFAULT 0,
                    open_issue_count INTEGER NOT NULL DEFAULT 0,
                    cached_at TIMESTAMPTZ,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE UNIQUE INDEX idx_repositories_natural_key
                    ON repositories(user_id, github_domain, owner, name);

                -- Stale-row scan: cached_at IS NULL OR cached_at < cutoff
                CREATE INDEX idx_repositories_cached_at ON repositories(cached_at);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS repositories CASCADE;")
            .await?;

        Ok(())
    }
}
