//! Reactions endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get},
};
use commentable_common::{AppResult, Page, PageQuery};
use commentable_core::{ReactionQuery, ReactionSummary, UpsertReactionInput};
use commentable_db::entities::reaction::{self, ReactionType};
use serde::Serialize;

use super::page_request;
use crate::{
    extractors::{CurrentActor, Json, Query},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Reaction response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionResponse {
    pub id: String,
    pub user_id: String,
    pub comment_id: String,
    pub reaction_type: ReactionType,
    pub created_at: String,
    pub updated_at: String,
}

impl From<reaction::Model> for ReactionResponse {
    fn from(r: reaction::Model) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            comment_id: r.comment_id,
            reaction_type: r.reaction_type,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

async fn list(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(query): Query<ReactionQuery>,
) -> AppResult<ApiResponse<Page<ReactionResponse>>> {
    let request = page_request(&state, &paging, state.config.pagination.default_page_size);
    let page = state.reaction_service.list(query, &request).await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

/// React to a comment. `data` is `null` when the call toggled a reaction off.
async fn upsert(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(input): Json<UpsertReactionInput>,
) -> AppResult<ApiResponse<Option<ReactionResponse>>> {
    let reaction = state.reaction_service.upsert(&actor, input).await?;
    Ok(ApiResponse::ok(reaction.map(Into::into)))
}

/// Per-type reaction counts for a comment.
async fn summary(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<ReactionSummary>> {
    let summary = state.reaction_service.summary(&comment_id).await?;
    Ok(ApiResponse::ok(summary))
}

async fn remove(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.reaction_service.delete(&actor, &id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(upsert))
        .route("/summary/{comment_id}", get(summary))
        .route("/{id}", delete(remove))
}
