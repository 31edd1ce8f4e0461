//! Migration: Create repository_assignable_users table.
//!
//! Local autocomplete index refreshed from the GraphQL assignableUsers query.

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
                CREATE TABLE repository_assignable_users (
                    id UUID PRIMARY KEY,
                    repository_id UUID NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
                    login VARCHAR(255) NOT NULL,
                    avatar_url VARCHAR(500),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE UNIQUE INDEX idx_assignable_users_repository_login
                    ON repository_assignable_users(repository_id, login);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS repository_assignable_users CASCADE;")
            .await?;

        Ok(())
    }
}
