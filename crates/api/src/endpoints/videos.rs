//! Videos endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
};
use commentable_common::{AppResult, Page, PageQuery};
use commentable_core::{CreateVideoInput, UpdateVideoInput, VideoQuery, VideoService};
use commentable_db::entities::{EntityStatus, video};
use serde::Serialize;

use super::{StatusRequest, page_request};
use crate::{
    extractors::{CurrentActor, Json, Query},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Video response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration: i32,
    pub view_count: i64,
    pub comment_count: i32,
    pub status: EntityStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<video::Model> for VideoResponse {
    fn from(v: video::Model) -> Self {
        Self {
            id: v.id,
            user_id: v.user_id,
            title: v.title,
            description: v.description,
            video_url: v.video_url,
            thumbnail_url: v.thumbnail_url,
            duration: v.duration,
            view_count: v.view_count,
            comment_count: v.comment_count,
            status: v.status,
            created_at: v.created_at.to_rfc3339(),
            updated_at: v.updated_at.to_rfc3339(),
        }
    }
}

/// List videos.
async fn list(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(query): Query<VideoQuery>,
) -> AppResult<ApiResponse<Page<VideoResponse>>> {
    let request = page_request(&state, &paging, VideoService::DEFAULT_PAGE_SIZE);
    let page = state.video_service.list(&actor, query, &request).await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

/// Create a video.
async fn create(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(input): Json<CreateVideoInput>,
) -> AppResult<ApiResponse<VideoResponse>> {
    let video = state.video_service.create(&actor, input).await?;
    Ok(ApiResponse::created(video.into()))
}

/// Get a video.
async fn show(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<VideoResponse>> {
    let video = state.video_service.get(&actor, &id).await?;
    Ok(ApiResponse::ok(video.into()))
}

/// Update a video.
async fn update(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateVideoInput>,
) -> AppResult<ApiResponse<VideoResponse>> {
    let video = state.video_service.update(&actor, &id, input).await?;
    Ok(ApiResponse::ok(video.into()))
}

/// Soft-delete a video.
async fn delete(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.video_service.delete(&actor, &id).await?;
    Ok(no_content())
}

/// Moderation status change.
async fn set_status(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> AppResult<ApiResponse<VideoResponse>> {
    let video = state
        .video_service
        .set_status(&actor, &id, req.status)
        .await?;
    Ok(ApiResponse::ok(video.into()))
}

/// Record a view.
async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.video_service.record_view(&id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(delete))
        .route("/{id}/status", put(set_status))
        .route("/{id}/views", post(record_view))
}
