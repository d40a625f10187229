//! Comments endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, put},
};
use commentable_common::{AppResult, Page, PageQuery};
use commentable_core::{
    CommentNode, CommentQuery, CommentView, CreateCommentInput, ReactionSummary,
    UpdateCommentInput,
};
use commentable_db::entities::{
    EntityStatus,
    comment::{self, CommentableType},
    reaction::ReactionType,
};
use serde::Serialize;

use super::{StatusRequest, page_request};
use crate::{
    extractors::{CurrentActor, Json, Query},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Comment author as shown next to a comment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub username: String,
    pub display_name: String,
}

/// Comment response. Annotations are present on reads only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub commentable_type: CommentableType,
    pub commentable_id: String,
    pub parent_comment_id: Option<String>,
    pub depth: i32,
    pub reply_count: i32,
    pub reaction_count: i32,
    pub status: EntityStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reactions: Option<ReactionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_reaction: Option<ReactionType>,
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            content: c.content,
            commentable_type: c.commentable_type,
            commentable_id: c.commentable_id,
            parent_comment_id: c.parent_comment_id,
            depth: c.depth,
            reply_count: c.reply_count,
            reaction_count: c.reaction_count,
            status: c.status,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
            author: None,
            reactions: None,
            viewer_reaction: None,
        }
    }
}

impl From<CommentView> for CommentResponse {
    fn from(view: CommentView) -> Self {
        let author = match (view.author_username, view.author_name) {
            (Some(username), Some(display_name)) => Some(AuthorResponse {
                username,
                display_name,
            }),
            _ => None,
        };
        Self {
            author,
            reactions: Some(view.reactions),
            viewer_reaction: view.viewer_reaction,
            ..view.comment.into()
        }
    }
}

/// A comment with its nested replies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentTreeResponse {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub replies: Vec<CommentTreeResponse>,
}

impl From<CommentNode> for CommentTreeResponse {
    fn from(node: CommentNode) -> Self {
        Self {
            comment: node.view.into(),
            replies: node.replies.into_iter().map(Into::into).collect(),
        }
    }
}

async fn list(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(query): Query<CommentQuery>,
) -> AppResult<ApiResponse<Page<CommentResponse>>> {
    let request = page_request(&state, &paging, state.config.pagination.default_page_size);
    let page = state.comment_service.list(&actor, query, &request).await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

async fn create(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.create(&actor, input).await?;
    Ok(ApiResponse::created(comment.into()))
}

async fn show(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let view = state.comment_service.get(&actor, &id).await?;
    Ok(ApiResponse::ok(view.into()))
}

async fn update(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.update(&actor, &id, input).await?;
    Ok(ApiResponse::ok(comment.into()))
}

async fn delete(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.comment_service.delete(&actor, &id).await?;
    Ok(no_content())
}

/// Direct replies of a comment.
async fn replies(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(paging): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<CommentResponse>>> {
    let request = page_request(&state, &paging, state.config.pagination.default_page_size);
    let page = state.comment_service.replies(&actor, &id, &request).await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

/// Nested reply tree under a comment.
async fn tree(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<CommentTreeResponse>> {
    let node = state.comment_service.tree(&actor, &id).await?;
    Ok(ApiResponse::ok(node.into()))
}

async fn set_status(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state
        .comment_service
        .set_status(&actor, &id, req.status)
        .await?;
    Ok(ApiResponse::ok(comment.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(delete))
        .route("/{id}/replies", get(replies))
        .route("/{id}/tree", get(tree))
        .route("/{id}/status", put(set_status))
}
