//! GitHub token entity.
//!
//! One encrypted personal access token per (user, GitHub domain) pair.
//! Written by the settings endpoints, consumed read-only by the sync job.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "github_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub domain: String,
    /// Base64 AES-256-GCM ciphertext. Never exposed in responses or logs.
    pub token_ciphertext: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
