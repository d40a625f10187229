//! Comment repository.
//!
//! Counters follow one rule: `reply_count` on a parent and `comment_count` on
//! the video or post only include visible comments (active or flagged). Every
//! write that changes a comment's visibility adjusts both in the same
//! transaction as the write itself.

use std::sync::Arc;

use super::paginate;
use crate::entities::{
    Comment, EntityStatus, Post, Video,
    comment::{self, CommentableType},
    post, video,
};
use chrono::Utc;
use commentable_common::{AppError, AppResult, Page, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Select, Set, TransactionTrait,
    prelude::DateTimeWithTimeZone, sea_query::Expr,
};

/// Which level of a thread to list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ParentFilter {
    /// Only comments without a parent.
    #[default]
    TopLevel,
    /// Direct replies of one comment.
    RepliesTo(String),
    /// Any level.
    Any,
}

/// Filters for listing comments.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    /// Restrict to one thread.
    pub commentable: Option<(CommentableType, String)>,
    pub parent: ParentFilter,
    /// Only comments by this author.
    pub user_id: Option<String>,
    /// Allowed statuses. Empty means visible statuses.
    pub statuses: Vec<EntityStatus>,
}

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID, whatever its status.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {id}")))
    }

    /// Find comments by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<comment::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Comment::find()
            .filter(comment::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a comment and bump the counters it contributes to.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if created.status.is_visible() {
            adjust_counters(&txn, &created, 1)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Replace a comment's content.
    pub async fn update_content(
        &self,
        comment: comment::Model,
        content: String,
    ) -> AppResult<comment::Model> {
        let mut active = comment.into_active_model();
        active.content = Set(content);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a comment to `to`, keeping counters in step.
    ///
    /// Returns `None` when the stored status no longer matches `comment.status`,
    /// i.e. someone else changed it first.
    pub async fn transition_status(
        &self,
        comment: comment::Model,
        to: EntityStatus,
    ) -> AppResult<Option<comment::Model>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let updated = transition_status_in(&txn, comment, to)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// List comments matching `filter`.
    pub async fn list(
        &self,
        filter: &CommentFilter,
        request: &PageRequest,
    ) -> AppResult<Page<comment::Model>> {
        paginate(
            self.db.as_ref(),
            filtered(filter),
            sort_column(request.sort_by.as_deref()),
            comment::Column::Id,
            request,
        )
        .await
    }

    /// Count comments matching `filter`.
    pub async fn count(&self, filter: &CommentFilter) -> AppResult<u64> {
        filtered(filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Visible comments of one thread deeper than `below_depth` and at most
    /// `max_depth`, oldest first.
    pub async fn find_visible_in_thread(
        &self,
        commentable_type: CommentableType,
        commentable_id: &str,
        below_depth: i32,
        max_depth: i32,
    ) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::CommentableType.eq(commentable_type))
            .filter(comment::Column::CommentableId.eq(commentable_id))
            .filter(comment::Column::Depth.gt(below_depth))
            .filter(comment::Column::Depth.lte(max_depth))
            .filter(comment::Column::Status.is_in(EntityStatus::VISIBLE))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Compare-and-set a comment's status on `conn` and adjust counters when the
/// comment becomes visible or invisible.
pub(crate) async fn transition_status_in<C>(
    conn: &C,
    comment: comment::Model,
    to: EntityStatus,
) -> Result<Option<comment::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let now: DateTimeWithTimeZone = Utc::now().into();
    let result = Comment::update_many()
        .col_expr(comment::Column::Status, Expr::value(to))
        .col_expr(comment::Column::UpdatedAt, Expr::value(now))
        .filter(comment::Column::Id.eq(comment.id.as_str()))
        .filter(comment::Column::Status.eq(comment.status))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }

    let was_visible = comment.status.is_visible();
    let updated = comment::Model {
        status: to,
        updated_at: now,
        ..comment
    };

    match (was_visible, to.is_visible()) {
        (true, false) => adjust_counters(conn, &updated, -1).await?,
        (false, true) => adjust_counters(conn, &updated, 1).await?,
        _ => {}
    }

    Ok(Some(updated))
}

/// Add `delta` to the parent's `reply_count` and the target's `comment_count`.
async fn adjust_counters<C>(conn: &C, comment: &comment::Model, delta: i32) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if let Some(parent_id) = &comment.parent_comment_id {
        Comment::update_many()
            .col_expr(
                comment::Column::ReplyCount,
                Expr::col(comment::Column::ReplyCount).add(delta),
            )
            .filter(comment::Column::Id.eq(parent_id.as_str()))
            .exec(conn)
            .await?;
    }

    match comment.commentable_type {
        CommentableType::Video => {
            Video::update_many()
                .col_expr(
                    video::Column::CommentCount,
                    Expr::col(video::Column::CommentCount).add(delta),
                )
                .filter(video::Column::Id.eq(comment.commentable_id.as_str()))
                .exec(conn)
                .await?;
        }
        CommentableType::Post => {
            Post::update_many()
                .col_expr(
                    post::Column::CommentCount,
                    Expr::col(post::Column::CommentCount).add(delta),
                )
                .filter(post::Column::Id.eq(comment.commentable_id.as_str()))
                .exec(conn)
                .await?;
        }
    }

    Ok(())
}

fn filtered(filter: &CommentFilter) -> Select<Comment> {
    let statuses = if filter.statuses.is_empty() {
        EntityStatus::VISIBLE.to_vec()
    } else {
        filter.statuses.clone()
    };

    let mut query = Comment::find().filter(comment::Column::Status.is_in(statuses));

    if let Some((kind, id)) = &filter.commentable {
        query = query
            .filter(comment::Column::CommentableType.eq(*kind))
            .filter(comment::Column::CommentableId.eq(id.as_str()));
    }

    query = match &filter.parent {
        ParentFilter::TopLevel => query.filter(comment::Column::ParentCommentId.is_null()),
        ParentFilter::RepliesTo(parent_id) => {
            query.filter(comment::Column::ParentCommentId.eq(parent_id.as_str()))
        }
        ParentFilter::Any => query,
    };

    if let Some(user_id) = &filter.user_id {
        query = query.filter(comment::Column::UserId.eq(user_id.as_str()));
    }

    query
}

fn sort_column(sort_by: Option<&str>) -> comment::Column {
    match sort_by.map(str::to_ascii_lowercase).as_deref() {
        Some("updatedat") => comment::Column::UpdatedAt,
        Some("replycount") => comment::Column::ReplyCount,
        Some("reactioncount") => comment::Column::ReactionCount,
        _ => comment::Column::CreatedAt,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction};

    fn create_test_comment(id: &str, parent: Option<&str>) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            content: "Nice".to_string(),
            commentable_type: CommentableType::Post,
            commentable_id: "p1".to_string(),
            parent_comment_id: parent.map(str::to_string),
            depth: i32::from(parent.is_some()),
            reply_count: 0,
            reaction_count: 0,
            status: EntityStatus::Active,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn exec_ok(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn statements(log: &[Transaction]) -> String {
        format!("{log:?}")
    }

    #[test]
    fn test_sort_column_allow_list() {
        assert!(matches!(sort_column(Some("replyCount")), comment::Column::ReplyCount));
        assert!(matches!(sort_column(Some("reactioncount")), comment::Column::ReactionCount));
        assert!(matches!(sort_column(Some("content")), comment::Column::CreatedAt));
    }

    #[tokio::test]
    async fn test_create_reply_bumps_parent_and_post() {
        let reply = create_test_comment("c2", Some("c1"));
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reply.clone()]])
                .append_exec_results([exec_ok(1), exec_ok(1)])
                .into_connection(),
        );

        let repo = CommentRepository::new(db.clone());
        let created = repo.create(reply.into_active_model()).await.unwrap();
        assert_eq!(created.parent_comment_id.as_deref(), Some("c1"));
        drop(repo);

        let log = statements(&Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(log.contains("reply_count"));
        assert!(log.contains("comment_count"));
    }

    #[tokio::test]
    async fn test_create_top_level_only_bumps_target() {
        let top = create_test_comment("c1", None);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[top.clone()]])
                .append_exec_results([exec_ok(1)])
                .into_connection(),
        );

        let repo = CommentRepository::new(db.clone());
        repo.create(top.into_active_model()).await.unwrap();
        drop(repo);

        let log = statements(&Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(log.contains("comment_count"));
    }

    #[tokio::test]
    async fn test_transition_to_deleted_decrements() {
        let reply = create_test_comment("c2", Some("c1"));
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_ok(1), exec_ok(1), exec_ok(1)])
                .into_connection(),
        );

        let repo = CommentRepository::new(db.clone());
        let updated = repo
            .transition_status(reply, EntityStatus::Deleted)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, EntityStatus::Deleted);
        drop(repo);

        let log = statements(&Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(log.contains("reply_count"));
        assert!(log.contains("Int(Some(-1))"));
    }

    #[tokio::test]
    async fn test_transition_between_visible_statuses_keeps_counters() {
        let comment = create_test_comment("c1", None);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_ok(1)])
                .into_connection(),
        );

        let repo = CommentRepository::new(db.clone());
        let updated = repo
            .transition_status(comment, EntityStatus::Flagged)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, EntityStatus::Flagged);
        drop(repo);

        let log = statements(&Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(!log.contains("comment_count"));
    }

    #[tokio::test]
    async fn test_transition_lost_race_returns_none() {
        let comment = create_test_comment("c1", None);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_ok(0)])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo
            .transition_status(comment, EntityStatus::Removed)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_replies_of_missing_parent_is_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let filter = CommentFilter {
            parent: ParentFilter::RepliesTo("nope".to_string()),
            ..Default::default()
        };
        let request = PageRequest::resolve(&commentable_common::PageQuery::default(), 20, 100);
        let page = repo.list(&filter, &request).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 0);
        assert_eq!(page.total_pages, 0);
    }
}
