//! Report entity (a user flagging a comment for moderators).

use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

/// Why a comment was reported.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ReportCategory {
    #[sea_orm(string_value = "spam")]
    Spam,
    #[sea_orm(string_value = "harassment")]
    Harassment,
    #[sea_orm(string_value = "hate_speech")]
    HateSpeech,
    #[sea_orm(string_value = "violence")]
    Violence,
    #[sea_orm(string_value = "sexual_content")]
    SexualContent,
    #[sea_orm(string_value = "misinformation")]
    Misinformation,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Report review status.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ReportStatus {
    /// Awaiting review. The only open status.
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    /// Acknowledged without action on the comment.
    #[sea_orm(string_value = "reviewed")]
    Reviewed,
    /// Upheld; the comment is removed.
    #[sea_orm(string_value = "resolved")]
    Resolved,
    /// Rejected; the comment stays.
    #[sea_orm(string_value = "dismissed")]
    Dismissed,
}

impl ReportStatus {
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Report model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// The user who submitted the report.
    pub user_id: String,
    /// The reported comment.
    pub comment_id: String,
    pub category: ReportCategory,
    /// Free-form details from the reporter.
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: ReportStatus,
    /// Moderator who reviewed the report.
    #[sea_orm(nullable)]
    pub reviewed_by: Option<String>,
    #[sea_orm(nullable)]
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub review_notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Reporter,

    #[sea_orm(
        belongs_to = "super::comment::Entity",
        from = "Column::CommentId",
        to = "super::comment::Column::Id",
        on_delete = "Cascade"
    )]
    Comment,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
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
