//! Video service.

use commentable_common::{AppError, AppResult, IdGenerator, Page, PageRequest};
use commentable_db::{
    entities::{EntityStatus, video},
    repositories::{VideoFilter, VideoRepository},
};
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use validator::Validate;

use crate::authorization::{Actor, Capability};
use crate::status::{self, Authority};

/// Input for creating a video.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(url, length(max = 2048))]
    pub video_url: String,

    #[validate(url, length(max = 2048))]
    pub thumbnail_url: Option<String>,

    /// Length in seconds.
    #[validate(range(min = 1, max = 86400))]
    pub duration: i32,
}

/// Input for updating a video. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(url, length(max = 2048))]
    pub video_url: Option<String>,

    #[validate(url, length(max = 2048))]
    pub thumbnail_url: Option<String>,

    #[validate(range(min = 1, max = 86400))]
    pub duration: Option<i32>,
}

/// Listing filters for videos.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuery {
    /// Substring of the title or description.
    pub search: Option<String>,
    pub user_id: Option<String>,
    /// Honored past visible statuses only for moderators.
    pub status: Option<EntityStatus>,
}

/// Video service for business logic.
#[derive(Clone)]
pub struct VideoService {
    video_repo: VideoRepository,
    id_gen: IdGenerator,
}

impl VideoService {
    /// Page size used when the caller does not ask for one.
    pub const DEFAULT_PAGE_SIZE: u64 = 12;

    /// Create a new video service.
    #[must_use]
    pub const fn new(video_repo: VideoRepository) -> Self {
        Self {
            video_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish a video owned by the actor.
    pub async fn create(&self, actor: &Actor, input: CreateVideoInput) -> AppResult<video::Model> {
        let user_id = actor.require(Capability::CreateContent)?;
        input.validate()?;

        let model = video::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            title: Set(input.title),
            description: Set(input.description),
            video_url: Set(input.video_url),
            thumbnail_url: Set(input.thumbnail_url),
            duration: Set(input.duration),
            view_count: Set(0),
            comment_count: Set(0),
            status: Set(EntityStatus::Active),
            ..Default::default()
        };

        let video = self.video_repo.create(model).await?;
        tracing::info!(video_id = %video.id, user_id, "Video created");
        Ok(video)
    }

    /// Get a video the actor is allowed to see.
    pub async fn get(&self, actor: &Actor, id: &str) -> AppResult<video::Model> {
        self.video_repo
            .find_by_id(id)
            .await?
            .filter(|v| actor.can_see(&v.user_id, v.status))
            .ok_or_else(|| AppError::NotFound(format!("Video {id}")))
    }

    /// Edit one of the actor's visible videos.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        input: UpdateVideoInput,
    ) -> AppResult<video::Model> {
        input.validate()?;
        let video = self.owned_visible(actor, id).await?;

        let mut active = video.into_active_model();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(video_url) = input.video_url {
            active.video_url = Set(video_url);
        }
        if let Some(thumbnail_url) = input.thumbnail_url {
            active.thumbnail_url = Set(Some(thumbnail_url));
        }
        if let Some(duration) = input.duration {
            active.duration = Set(duration);
        }

        self.video_repo.update(active).await
    }

    /// Soft-delete one of the actor's videos.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<video::Model> {
        let user_id = actor.require(Capability::CreateContent)?;
        let video = self.get(actor, id).await?;
        if video.user_id != user_id {
            return Err(AppError::Forbidden("Not the owner of this video".to_string()));
        }
        status::check(Authority::Owner, video.status, EntityStatus::Deleted)?;

        let deleted = self
            .video_repo
            .set_status(video, EntityStatus::Deleted)
            .await?;
        tracing::info!(video_id = %deleted.id, user_id, "Video deleted");
        Ok(deleted)
    }

    /// Apply a moderation transition.
    pub async fn set_status(
        &self,
        actor: &Actor,
        id: &str,
        to: EntityStatus,
    ) -> AppResult<video::Model> {
        let moderator_id = actor.require(Capability::ModerateContent)?;
        let video = self.video_repo.get_by_id(id).await?;
        status::check(Authority::Moderator, video.status, to)?;

        let updated = self.video_repo.set_status(video, to).await?;
        tracing::info!(video_id = %updated.id, moderator_id, status = ?to, "Video status changed");
        Ok(updated)
    }

    /// List videos.
    pub async fn list(
        &self,
        actor: &Actor,
        query: VideoQuery,
        request: &PageRequest,
    ) -> AppResult<Page<video::Model>> {
        let filter = VideoFilter {
            search: query.search.filter(|s| !s.trim().is_empty()),
            user_id: query.user_id,
            statuses: actor.listable_statuses(query.status),
        };
        self.video_repo.list(&filter, request).await
    }

    /// Count one view of a visible video.
    pub async fn record_view(&self, id: &str) -> AppResult<()> {
        if self.video_repo.record_view(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Video {id}")))
        }
    }

    async fn owned_visible(&self, actor: &Actor, id: &str) -> AppResult<video::Model> {
        let user_id = actor.require(Capability::CreateContent)?;
        let video = self.get(actor, id).await?;
        if video.user_id != user_id {
            return Err(AppError::Forbidden("Not the owner of this video".to_string()));
        }
        if !video.status.is_visible() {
            return Err(AppError::Conflict(format!(
                "Video {id} is {:?} and cannot be edited",
                video.status
            )));
        }
        Ok(video)
    }
}
