//! Migration: Create issues table.

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
                CREATE TABLE issues (
                    id UUID PRIMARY KEY,
                    repository_id UUID NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
                    number INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    state VARCHAR(20) NOT NULL CHECK (state IN ('open', 'closed')),
                    body TEXT,
                    author_login VARCHAR(255),
                    author_avatar_url VARCHAR(500),
                    labels JSONB NOT NULL DEFAULT '[]',
                    assignees JSONB NOT NULL DEFAULT '[]',
                    comment_count INTEGER NOT NULL DEFAULT 0,
                    github_created_at TIMESTAMPTZ NOT NULL,
                    github_updated_at TIMESTAMPTZ NOT NULL,
                    cached_at TIMESTAMPTZ,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE UNIQUE INDEX idx_issues_repository_number
                    ON issues(repository_id, number);

                -- Filter composition: state equality and JSONB containment
                CREATE INDEX idx_issues_repository_state ON issues(repository_id, state);
                CREATE INDEX idx_issues_labels ON issues USING GIN (labels);
                CREATE INDEX idx_issues_assignees ON issues USING GIN (assignees);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS issues CASCADE;")
            .await?;

        Ok(())
    }
}
