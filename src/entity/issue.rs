//! Issue entity. Cached snapshot of a GitHub issue, unique per
//! (repository_id, number).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub repository_id: Uuid,
    pub number: i32,
    pub title: String,
    /// 'open' or 'closed'
    pub state: String,
    pub body: Option<String>,
    pub author_login: Option<String>,
    pub author_avatar_url: Option<String>,
    /// Ordered JSON list of {name}
    pub labels: Json,
    /// Ordered JSON list of {login, avatar_url}
    pub assignees: Json,
    pub comment_count: i32,
    pub github_created_at: DateTimeUtc,
    pub github_updated_at: DateTimeUtc,
    pub cached_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
