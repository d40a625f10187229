//! Stats endpoint.

use axum::{Router, extract::State, routing::get};
use commentable_common::AppResult;
use commentable_core::Stats;

use crate::{extractors::CurrentActor, middleware::AppState, response::ApiResponse};

async fn stats(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Stats>> {
    let stats = state.stats_service.get(&actor).await?;
    Ok(ApiResponse::ok(stats))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(stats))
}
