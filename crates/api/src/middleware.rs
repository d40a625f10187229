//! Application state and request middleware.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use commentable_common::Config;
use commentable_core::{
    CommentService, CommentableResolver, ModerationService, PostService, ReactionService,
    StatsService, UserService, VideoService,
};
use commentable_db::repositories::{
    CommentRepository, PostRepository, ReactionRepository, ReportRepository, UserRepository,
    VideoRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<Config>,
    pub user_service: UserService,
    pub video_service: VideoService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub reaction_service: ReactionService,
    pub moderation_service: ModerationService,
    pub stats_service: StatsService,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: Config) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let video_repo = VideoRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let reaction_repo = ReactionRepository::new(Arc::clone(&db));
        let report_repo = ReportRepository::new(Arc::clone(&db));

        let resolver = CommentableResolver::new(video_repo.clone(), post_repo.clone());

        Self {
            user_service: UserService::new(user_repo.clone()),
            video_service: VideoService::new(video_repo.clone()),
            post_service: PostService::new(post_repo.clone()),
            comment_service: CommentService::new(
                comment_repo.clone(),
                user_repo.clone(),
                reaction_repo.clone(),
                resolver,
                &config,
            ),
            reaction_service: ReactionService::new(reaction_repo.clone(), comment_repo.clone()),
            moderation_service: ModerationService::new(
                report_repo.clone(),
                comment_repo.clone(),
                user_repo,
                &config,
            ),
            stats_service: StatsService::new(
                video_repo,
                post_repo,
                comment_repo,
                reaction_repo,
                report_repo,
            ),
            db,
            config: Arc::new(config),
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Requests without a valid token continue anonymously.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .map(str::to_string);

    if let Some(token) = token {
        match state.user_service.authenticate(&token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => tracing::debug!("Unknown bearer token"),
            Err(e) => tracing::warn!(error = %e, "Failed to resolve bearer token"),
        }
    }

    next.run(req).await
}
