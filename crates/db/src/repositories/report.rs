//! Report repository.

use std::sync::Arc;

use super::{comment::transition_status_in, map_write_err, paginate};
use crate::entities::{
    Comment, EntityStatus, Report, comment,
    report::{self, ReportCategory, ReportStatus},
};
use chrono::Utc;
use commentable_common::{AppError, AppResult, Page, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Select, TransactionTrait, prelude::DateTimeWithTimeZone,
    sea_query::Expr,
};

/// Filters for listing reports.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub category: Option<ReportCategory>,
    pub comment_id: Option<String>,
    /// Only reports filed by this user.
    pub user_id: Option<String>,
}

/// What a review does to the reported comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentEffect {
    /// Leave the comment alone.
    Keep,
    /// Take the comment down unless it is already deleted or removed.
    Remove,
    /// Return a flagged comment to active once no pending reports remain.
    RestoreIfUnreported,
}

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a report by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {id}")))
    }

    /// Find the report a user filed against a comment, if any.
    pub async fn find_by_user_and_comment(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> AppResult<Option<report::Model>> {
        Report::find()
            .filter(report::Column::UserId.eq(user_id))
            .filter(report::Column::CommentId.eq(comment_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a report. When the comment then has at least `flag_threshold`
    /// pending reports and is still active, it is flagged in the same
    /// transaction.
    ///
    /// Returns the report and, if it was flagged, the updated comment.
    pub async fn create(
        &self,
        model: report::ActiveModel,
        flag_threshold: u64,
    ) -> AppResult<(report::Model, Option<comment::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = model
            .insert(&txn)
            .await
            .map_err(|e| map_write_err(e, "Report"))?;

        let pending = count_pending(&txn, &created.comment_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut flagged = None;
        if pending >= flag_threshold {
            let target = Comment::find_by_id(created.comment_id.as_str())
                .one(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if let Some(target) = target.filter(|c| c.status == EntityStatus::Active) {
                flagged = transition_status_in(&txn, target, EntityStatus::Flagged)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(comment) = &flagged {
            tracing::info!(comment_id = %comment.id, pending, "Comment flagged by reports");
        }

        Ok((created, flagged))
    }

    /// Record a review on a pending report and apply `effect` to its comment.
    ///
    /// Fails with [`AppError::Conflict`] if the report is no longer pending.
    /// Returns the reviewed report and the comment if its status changed.
    pub async fn review(
        &self,
        report: report::Model,
        status: ReportStatus,
        reviewer_id: &str,
        notes: Option<String>,
        effect: CommentEffect,
    ) -> AppResult<(report::Model, Option<comment::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = Report::update_many()
            .col_expr(report::Column::Status, Expr::value(status))
            .col_expr(report::Column::ReviewedBy, Expr::value(reviewer_id))
            .col_expr(report::Column::ReviewedAt, Expr::value(now))
            .col_expr(report::Column::ReviewNotes, Expr::value(notes.clone()))
            .col_expr(report::Column::UpdatedAt, Expr::value(now))
            .filter(report::Column::Id.eq(report.id.as_str()))
            .filter(report::Column::Status.eq(ReportStatus::Pending))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "Report {} has already been reviewed",
                report.id
            )));
        }

        let changed = apply_effect(&txn, &report.comment_id, effect)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let reviewed = report::Model {
            status,
            reviewed_by: Some(reviewer_id.to_string()),
            reviewed_at: Some(now),
            review_notes: notes,
            updated_at: now,
            ..report
        };

        Ok((reviewed, changed))
    }

    /// List reports matching `filter`.
    pub async fn list(
        &self,
        filter: &ReportFilter,
        request: &PageRequest,
    ) -> AppResult<Page<report::Model>> {
        let sort = match request.sort_by.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("updatedat") => report::Column::UpdatedAt,
            Some("reportstatus") => report::Column::Status,
            _ => report::Column::CreatedAt,
        };

        paginate(
            self.db.as_ref(),
            filtered(filter),
            sort,
            report::Column::Id,
            request,
        )
        .await
    }

    /// Count reports matching `filter`.
    pub async fn count(&self, filter: &ReportFilter) -> AppResult<u64> {
        filtered(filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

async fn count_pending<C>(conn: &C, comment_id: &str) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    Report::find()
        .filter(report::Column::CommentId.eq(comment_id))
        .filter(report::Column::Status.eq(ReportStatus::Pending))
        .count(conn)
        .await
}

async fn apply_effect<C>(
    conn: &C,
    comment_id: &str,
    effect: CommentEffect,
) -> Result<Option<comment::Model>, DbErr>
where
    C: ConnectionTrait,
{
    if effect == CommentEffect::Keep {
        return Ok(None);
    }

    let Some(target) = Comment::find_by_id(comment_id).one(conn).await? else {
        return Ok(None);
    };

    match effect {
        CommentEffect::Remove if !target.status.is_terminal() => {
            transition_status_in(conn, target, EntityStatus::Removed).await
        }
        CommentEffect::RestoreIfUnreported if target.status == EntityStatus::Flagged => {
            if count_pending(conn, comment_id).await? == 0 {
                transition_status_in(conn, target, EntityStatus::Active).await
            } else {
                Ok(None)
            }
        }
        _ => Ok(None),
    }
}

fn filtered(filter: &ReportFilter) -> Select<Report> {
    let mut query = Report::find();

    if let Some(status) = filter.status {
        query = query.filter(report::Column::Status.eq(status));
    }
    if let Some(category) = filter.category {
        query = query.filter(report::Column::Category.eq(category));
    }
    if let Some(comment_id) = &filter.comment_id {
        query = query.filter(report::Column::CommentId.eq(comment_id.as_str()));
    }
    if let Some(user_id) = &filter.user_id {
        query = query.filter(report::Column::UserId.eq(user_id.as_str()));
    }

    query
}
