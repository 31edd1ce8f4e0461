//! Migration: Create issue_comments table.

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
                CREATE TABLE issue_comments (
                    id UUID PRIMARY KEY,
                    issue_id UUID NOT NULL REFERENCES issues(id) ON DELETE CASCADE,
                    github_id BIGINT NOT NULL,
                    body TEXT,
                    author_login VARCHAR(255),
                    author_avatar_url VARCHAR(500),
                    github_created_at TIMESTAMPTZ NOT NULL,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE UNIQUE INDEX idx_issue_comments_issue_github_id
                    ON issue_comments(issue_id, github_id);

                -- Chronological display order
                CREATE INDEX idx_issue_comments_created
                    ON issue_comments(issue_id, github_created_at);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS issue_comments CASCADE;")
            .await?;

        Ok(())
    }
}
