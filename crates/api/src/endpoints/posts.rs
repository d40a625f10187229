//! Posts endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
};
use commentable_common::{AppResult, Page, PageQuery};
use commentable_core::{CreatePostInput, PostQuery, PostService, UpdatePostInput};
use commentable_db::entities::{EntityStatus, post};
use serde::Serialize;

use super::{StatusRequest, page_request};
use crate::{
    extractors::{CurrentActor, Json, Query},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Post response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub featured_image_url: Option<String>,
    pub published_at: Option<String>,
    pub view_count: i64,
    pub comment_count: i32,
    pub status: EntityStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<post::Model> for PostResponse {
    fn from(p: post::Model) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            title: p.title,
            content: p.content,
            slug: p.slug,
            featured_image_url: p.featured_image_url,
            published_at: p.published_at.map(|t| t.to_rfc3339()),
            view_count: p.view_count,
            comment_count: p.comment_count,
            status: p.status,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

async fn list(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(query): Query<PostQuery>,
) -> AppResult<ApiResponse<Page<PostResponse>>> {
    let request = page_request(&state, &paging, PostService::DEFAULT_PAGE_SIZE);
    let page = state.post_service.list(&actor, query, &request).await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

async fn create(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.create(&actor, input).await?;
    Ok(ApiResponse::created(post.into()))
}

async fn show(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.get(&actor, &id).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Get a post by its slug.
async fn show_by_slug(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.get_by_slug(&actor, &slug).await?;
    Ok(ApiResponse::ok(post.into()))
}

async fn update(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.update(&actor, &id, input).await?;
    Ok(ApiResponse::ok(post.into()))
}

async fn delete(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.post_service.delete(&actor, &id).await?;
    Ok(no_content())
}

async fn set_status(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.set_status(&actor, &id, req.status).await?;
    Ok(ApiResponse::ok(post.into()))
}

async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.post_service.record_view(&id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/slug/{slug}", get(show_by_slug))
        .route("/{id}", get(show).put(update).delete(delete))
        .route("/{id}/status", put(set_status))
        .route("/{id}/views", post(record_view))
}
