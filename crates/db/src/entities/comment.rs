//! Comment entity.
//!
//! A comment belongs to exactly one commentable (a video or a post), named by
//! `commentable_type` + `commentable_id`. There is no foreign key behind that
//! pair; callers resolve the target before inserting. Replies point at their
//! parent through `parent_comment_id` and always share the parent's thread.

use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use super::entity_status::EntityStatus;

/// Kind of entity a comment is attached to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CommentableType {
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "post")]
    Post,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author
    pub user_id: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub commentable_type: CommentableType,

    pub commentable_id: String,

    #[sea_orm(nullable)]
    pub parent_comment_id: Option<String>,

    /// 0 for top-level comments, parent depth + 1 for replies
    pub depth: i32,

    /// Visible direct replies
    pub reply_count: i32,

    pub reaction_count: i32,

    pub status: EntityStatus,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether `other` is attached to the same video or post.
    #[must_use]
    pub fn same_thread(&self, other: &Self) -> bool {
        self.commentable_type == other.commentable_type
            && self.commentable_id == other.commentable_id
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentCommentId",
        to = "Column::Id",
        on_delete = "Restrict"
    )]
    Parent,

    #[sea_orm(has_many = "super::reaction::Entity")]
    Reactions,

    #[sea_orm(has_many = "super::report::Entity")]
    Reports,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::reaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reactions.def()
    }
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        if insert && self.created_at.is_not_set() {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
