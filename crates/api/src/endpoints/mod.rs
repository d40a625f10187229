//! API endpoints.

mod comments;
mod posts;
mod reactions;
mod reports;
mod stats;
mod users;
mod videos;

pub use comments::{AuthorResponse, CommentResponse, CommentTreeResponse};
pub use posts::PostResponse;
pub use reactions::ReactionResponse;
pub use reports::ReportResponse;
pub use users::{MeResponse, RegisterResponse, UserResponse};
pub use videos::VideoResponse;

use axum::{Json, Router, extract::State};
use commentable_common::{AppResult, PageQuery, PageRequest};
use commentable_db::entities::EntityStatus;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::middleware::AppState;

/// Body of the moderation status endpoints.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: EntityStatus,
}

/// Resolve paging parameters with a per-resource default page size.
fn page_request(state: &AppState, query: &PageQuery, default_page_size: u64) -> PageRequest {
    PageRequest::resolve(
        query,
        default_page_size,
        state.config.pagination.max_page_size,
    )
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/videos", videos::router())
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
        .nest("/reactions", reactions::router())
        .nest("/reports", reports::router())
        .nest("/stats", stats::router())
}

/// Liveness check that also pings the database.
pub async fn health(State(state): State<AppState>) -> AppResult<Json<Value>> {
    commentable_db::ping(&state.db).await?;
    Ok(Json(json!({ "status": "ok" })))
}
