//! Things comments can be attached to.

use commentable_common::{AppError, AppResult};
use commentable_db::{
    entities::{EntityStatus, comment::CommentableType, post, video},
    repositories::{PostRepository, VideoRepository},
};

/// A resolved comment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commentable {
    Video(video::Model),
    Post(post::Model),
}

impl Commentable {
    #[must_use]
    pub const fn kind(&self) -> CommentableType {
        match self {
            Self::Video(_) => CommentableType::Video,
            Self::Post(_) => CommentableType::Post,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Video(v) => &v.id,
            Self::Post(p) => &p.id,
        }
    }

    #[must_use]
    pub const fn status(&self) -> EntityStatus {
        match self {
            Self::Video(v) => v.status,
            Self::Post(p) => p.status,
        }
    }
}

/// Looks up a [`Commentable`] in the table its type names.
#[derive(Clone)]
pub struct CommentableResolver {
    video_repo: VideoRepository,
    post_repo: PostRepository,
}

impl CommentableResolver {
    #[must_use]
    pub const fn new(video_repo: VideoRepository, post_repo: PostRepository) -> Self {
        Self {
            video_repo,
            post_repo,
        }
    }

    /// Resolve a visible video or post. Missing and hidden targets are both
    /// reported as not found.
    pub async fn resolve(&self, kind: CommentableType, id: &str) -> AppResult<Commentable> {
        let target = match kind {
            CommentableType::Video => self.video_repo.find_by_id(id).await?.map(Commentable::Video),
            CommentableType::Post => self.post_repo.find_by_id(id).await?.map(Commentable::Post),
        };

        target
            .filter(|t| t.status().is_visible())
            .ok_or_else(|| AppError::NotFound(format!("{kind:?} {id}")))
    }
}
