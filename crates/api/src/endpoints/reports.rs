//! Reports endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, put},
};
use commentable_common::{AppResult, Page, PageQuery};
use commentable_core::{
    CreateReportInput, ReportOutcome, ReportQuery, ReportView, ReviewReportInput,
};
use commentable_db::entities::{
    EntityStatus,
    report::{self, ReportCategory, ReportStatus},
};
use serde::Serialize;

use super::page_request;
use crate::{
    extractors::{CurrentActor, Json, Query},
    middleware::AppState,
    response::ApiResponse,
};

/// Report response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub user_id: String,
    pub comment_id: String,
    pub category: ReportCategory,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub review_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_excerpt: Option<String>,
    /// New status of the comment when filing or reviewing changed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_status: Option<EntityStatus>,
}

impl From<report::Model> for ReportResponse {
    fn from(r: report::Model) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            comment_id: r.comment_id,
            category: r.category,
            description: r.description,
            status: r.status,
            reviewed_by: r.reviewed_by,
            reviewed_at: r.reviewed_at.map(|t| t.to_rfc3339()),
            review_notes: r.review_notes,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
            reporter_username: None,
            reviewer_username: None,
            comment_excerpt: None,
            comment_status: None,
        }
    }
}

impl From<ReportView> for ReportResponse {
    fn from(view: ReportView) -> Self {
        Self {
            reporter_username: view.reporter_username,
            reviewer_username: view.reviewer_username,
            comment_excerpt: view.comment_excerpt,
            ..view.report.into()
        }
    }
}

impl From<ReportOutcome> for ReportResponse {
    fn from(outcome: ReportOutcome) -> Self {
        Self {
            comment_status: outcome.comment.map(|c| c.status),
            ..outcome.report.into()
        }
    }
}

async fn list(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(query): Query<ReportQuery>,
) -> AppResult<ApiResponse<Page<ReportResponse>>> {
    let request = page_request(&state, &paging, state.config.pagination.default_page_size);
    let page = state
        .moderation_service
        .list(&actor, query, &request)
        .await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

/// Report a comment.
async fn create(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(input): Json<CreateReportInput>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let outcome = state.moderation_service.create_report(&actor, input).await?;
    Ok(ApiResponse::created(outcome.into()))
}

async fn show(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let view = state.moderation_service.get(&actor, &id).await?;
    Ok(ApiResponse::ok(view.into()))
}

/// Review a pending report.
async fn review(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ReviewReportInput>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let outcome = state.moderation_service.review(&actor, &id, input).await?;
    Ok(ApiResponse::ok(outcome.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show))
        .route("/{id}/review", put(review))
}
