//! Moderation service: abuse reports on comments and their review.

use std::collections::HashMap;

use commentable_common::{AppError, AppResult, Config, IdGenerator, Page, PageRequest};
use commentable_db::{
    entities::{
        comment,
        report::{self, ReportCategory, ReportStatus},
    },
    repositories::{
        CommentEffect, CommentRepository, ReportFilter, ReportRepository, UserRepository,
    },
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::authorization::{Actor, Capability};

/// Longest comment excerpt shown with a report.
const EXCERPT_CHARS: usize = 140;

/// Input for reporting a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportInput {
    pub comment_id: String,
    pub category: ReportCategory,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Input for reviewing a report.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReportInput {
    pub status: ReportStatus,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Listing filters for reports.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub status: Option<ReportStatus>,
    pub category: Option<ReportCategory>,
    pub comment_id: Option<String>,
}

/// A report with the names and text a moderator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportView {
    pub report: report::Model,
    pub reporter_username: Option<String>,
    pub reviewer_username: Option<String>,
    pub comment_excerpt: Option<String>,
}

/// The outcome of filing or reviewing a report.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub report: report::Model,
    /// The reported comment, when its status changed as a result.
    pub comment: Option<comment::Model>,
}

/// How a review decision affects the reported comment.
#[must_use]
pub const fn effect_of(status: ReportStatus) -> CommentEffect {
    match status {
        ReportStatus::Resolved => CommentEffect::Remove,
        ReportStatus::Dismissed => CommentEffect::RestoreIfUnreported,
        ReportStatus::Pending | ReportStatus::Reviewed => CommentEffect::Keep,
    }
}

/// Moderation service for business logic.
#[derive(Clone)]
pub struct ModerationService {
    report_repo: ReportRepository,
    comment_repo: CommentRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
    flag_threshold: u64,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub fn new(
        report_repo: ReportRepository,
        comment_repo: CommentRepository,
        user_repo: UserRepository,
        config: &Config,
    ) -> Self {
        Self {
            report_repo,
            comment_repo,
            user_repo,
            id_gen: IdGenerator::new(),
            flag_threshold: config.moderation.flag_threshold,
        }
    }

    /// File a report against a comment. Enough pending reports flag it.
    pub async fn create_report(
        &self,
        actor: &Actor,
        input: CreateReportInput,
    ) -> AppResult<ReportOutcome> {
        let user_id = actor.require(Capability::Report)?;
        input.validate()?;

        let comment = self.comment_repo.get_by_id(&input.comment_id).await?;
        if !comment.status.is_visible() {
            return Err(AppError::NotFound(format!("Comment {}", comment.id)));
        }

        if self
            .report_repo
            .find_by_user_and_comment(user_id, &comment.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "You have already reported this comment".to_string(),
            ));
        }

        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            comment_id: Set(comment.id),
            category: Set(input.category),
            description: Set(input.description.filter(|d| !d.trim().is_empty())),
            status: Set(ReportStatus::Pending),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            review_notes: Set(None),
            ..Default::default()
        };

        let (report, flagged) = self.report_repo.create(model, self.flag_threshold).await?;
        tracing::info!(
            report_id = %report.id,
            comment_id = %report.comment_id,
            user_id,
            category = ?report.category,
            "Report filed"
        );

        Ok(ReportOutcome {
            report,
            comment: flagged,
        })
    }

    /// Review a pending report.
    pub async fn review(
        &self,
        actor: &Actor,
        id: &str,
        input: ReviewReportInput,
    ) -> AppResult<ReportOutcome> {
        let reviewer_id = actor.require(Capability::ReviewReports)?;
        input.validate()?;
        if input.status == ReportStatus::Pending {
            return Err(AppError::Validation(
                "A review must move the report out of Pending".to_string(),
            ));
        }

        let report = self.report_repo.get_by_id(id).await?;
        if !report.status.is_open() {
            return Err(AppError::Conflict(format!(
                "Report {id} has already been reviewed"
            )));
        }

        let (report, comment) = self
            .report_repo
            .review(
                report,
                input.status,
                reviewer_id,
                input.notes,
                effect_of(input.status),
            )
            .await?;

        tracing::info!(
            report_id = %report.id,
            reviewer_id,
            status = ?report.status,
            comment_status = ?comment.as_ref().map(|c| c.status),
            "Report reviewed"
        );

        Ok(ReportOutcome { report, comment })
    }

    /// Get a report. Visible to its reporter and to reviewers.
    pub async fn get(&self, actor: &Actor, id: &str) -> AppResult<ReportView> {
        let user_id = actor.require(Capability::Report)?;
        let report = self.report_repo.get_by_id(id).await?;
        if report.user_id != user_id && !actor.can(Capability::ReviewReports) {
            return Err(AppError::Forbidden("Not your report".to_string()));
        }

        self.enrich(vec![report])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Enriching a report lost it".to_string()))
    }

    /// List reports. Reviewers see every report, everyone else their own.
    pub async fn list(
        &self,
        actor: &Actor,
        query: ReportQuery,
        request: &PageRequest,
    ) -> AppResult<Page<ReportView>> {
        let user_id = actor.require(Capability::Report)?;
        let filter = ReportFilter {
            status: query.status,
            category: query.category,
            comment_id: query.comment_id,
            user_id: (!actor.can(Capability::ReviewReports)).then(|| user_id.to_string()),
        };

        let (reports, meta) = self.report_repo.list(&filter, request).await?.into_parts();
        let views = self.enrich(reports).await?;
        Ok(Page::with_items(views, &meta))
    }

    async fn enrich(&self, reports: Vec<report::Model>) -> AppResult<Vec<ReportView>> {
        if reports.is_empty() {
            return Ok(vec![]);
        }

        let mut user_ids: Vec<String> = reports
            .iter()
            .flat_map(|r| std::iter::once(r.user_id.clone()).chain(r.reviewed_by.clone()))
            .collect();
        user_ids.sort();
        user_ids.dedup();

        let mut comment_ids: Vec<String> = reports.iter().map(|r| r.comment_id.clone()).collect();
        comment_ids.sort();
        comment_ids.dedup();

        let usernames: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let excerpts: HashMap<String, String> = self
            .comment_repo
            .find_by_ids(&comment_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, excerpt(&c.content)))
            .collect();

        Ok(reports
            .into_iter()
            .map(|report| ReportView {
                reporter_username: usernames.get(&report.user_id).cloned(),
                reviewer_username: report
                    .reviewed_by
                    .as_ref()
                    .and_then(|id| usernames.get(id).cloned()),
                comment_excerpt: excerpts.get(&report.comment_id).cloned(),
                report,
            })
            .collect())
    }
}

fn excerpt(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
