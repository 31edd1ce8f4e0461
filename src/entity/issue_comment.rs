//! Issue comment entity. Immutable cached snapshot of a GitHub comment,
//! unique per (issue_id, github_id). Displayed in chronological order.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "issue_comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub issue_id: Uuid,
    pub github_id: i64,
    pub body: Option<String>,
    pub author_login: Option<String>,
    pub author_avatar_url: Option<String>,
    pub github_created_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
