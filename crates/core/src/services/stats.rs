//! Dashboard statistics.

use commentable_common::AppResult;
use commentable_db::{
    entities::{EntityStatus, report::ReportStatus},
    repositories::{
        CommentFilter, CommentRepository, ParentFilter, PostFilter, PostRepository,
        ReactionFilter, ReactionRepository, ReportFilter, ReportRepository, VideoFilter,
        VideoRepository,
    },
};
use serde::Serialize;

use crate::authorization::{Actor, Capability};

/// Site-wide counts with per-viewer extras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_videos: u64,
    pub total_posts: u64,
    pub total_comments: u64,
    pub total_reactions: u64,
    /// Present for authenticated viewers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mine: Option<UserStats>,
    /// Present for moderators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation: Option<ModerationStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub videos: u64,
    pub posts: u64,
    pub comments: u64,
    pub reactions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationStats {
    pub pending_reports: u64,
    pub flagged_comments: u64,
    pub flagged_videos: u64,
    pub flagged_posts: u64,
}

#[derive(Clone)]
pub struct StatsService {
    video_repo: VideoRepository,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    reaction_repo: ReactionRepository,
    report_repo: ReportRepository,
}

impl StatsService {
    #[must_use]
    pub const fn new(
        video_repo: VideoRepository,
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        reaction_repo: ReactionRepository,
        report_repo: ReportRepository,
    ) -> Self {
        Self {
            video_repo,
            post_repo,
            comment_repo,
            reaction_repo,
            report_repo,
        }
    }

    /// Counts for the dashboard as seen by `actor`.
    pub async fn get(&self, actor: &Actor) -> AppResult<Stats> {
        let all_videos = VideoFilter::default();
        let all_posts = PostFilter::default();
        let all_comments = CommentFilter {
            parent: ParentFilter::Any,
            ..Default::default()
        };
        let all_reactions = ReactionFilter::default();

        let (total_videos, total_posts, total_comments, total_reactions) = tokio::try_join!(
            self.video_repo.count(&all_videos),
            self.post_repo.count(&all_posts),
            self.comment_repo.count(&all_comments),
            self.reaction_repo.count(&all_reactions),
        )?;

        let mine = match actor.user_id.as_deref() {
            Some(user_id) => Some(self.user_stats(user_id).await?),
            None => None,
        };

        let moderation = if actor.can(Capability::ModerateContent) {
            Some(self.moderation_stats().await?)
        } else {
            None
        };

        Ok(Stats {
            total_videos,
            total_posts,
            total_comments,
            total_reactions,
            mine,
            moderation,
        })
    }

    async fn user_stats(&self, user_id: &str) -> AppResult<UserStats> {
        let videos = VideoFilter {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        };
        let posts = PostFilter {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        };
        let comments = CommentFilter {
            parent: ParentFilter::Any,
            user_id: Some(user_id.to_string()),
            ..Default::default()
        };
        let reactions = ReactionFilter {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        };

        let (videos, posts, comments, reactions) = tokio::try_join!(
            self.video_repo.count(&videos),
            self.post_repo.count(&posts),
            self.comment_repo.count(&comments),
            self.reaction_repo.count(&reactions),
        )?;

        Ok(UserStats {
            videos,
            posts,
            comments,
            reactions,
        })
    }

    async fn moderation_stats(&self) -> AppResult<ModerationStats> {
        let flagged = vec![EntityStatus::Flagged];
        let pending = ReportFilter {
            status: Some(ReportStatus::Pending),
            ..Default::default()
        };
        let comments = CommentFilter {
            parent: ParentFilter::Any,
            statuses: flagged.clone(),
            ..Default::default()
        };
        let videos = VideoFilter {
            statuses: flagged.clone(),
            ..Default::default()
        };
        let posts = PostFilter {
            statuses: flagged,
            ..Default::default()
        };

        let (pending_reports, flagged_comments, flagged_videos, flagged_posts) = tokio::try_join!(
            self.report_repo.count(&pending),
            self.comment_repo.count(&comments),
            self.video_repo.count(&videos),
            self.post_repo.count(&posts),
        )?;

        Ok(ModerationStats {
            pending_reports,
            flagged_comments,
            flagged_videos,
            flagged_posts,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{actor, count_row};
    use commentable_db::entities::user::UserRole;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service_with(db: MockDatabase) -> StatsService {
        let db: Arc<DatabaseConnection> = Arc::new(db.into_connection());
        StatsService::new(
            VideoRepository::new(db.clone()),
            PostRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            ReactionRepository::new(db.clone()),
            ReportRepository::new(db),
        )
    }

    fn counts(values: &[i64]) -> MockDatabase {
        values.iter().fold(
            MockDatabase::new(DatabaseBackend::Postgres),
            |db, n| db.append_query_results([[count_row(*n)]]),
        )
    }

    #[tokio::test]
    async fn test_anonymous_sees_totals_only() {
        let service = service_with(counts(&[1, 2, 3, 4]));

        let stats = service.get(&Actor::anonymous()).await.unwrap();
        assert_eq!(
            stats.total_videos + stats.total_posts + stats.total_comments + stats.total_reactions,
            10
        );
        assert!(stats.mine.is_none());
        assert!(stats.moderation.is_none());
    }

    #[tokio::test]
    async fn test_user_sees_own_counts() {
        let service = service_with(counts(&[1; 8]));

        let stats = service.get(&actor("u1", UserRole::User)).await.unwrap();
        assert_eq!(
            stats.mine,
            Some(UserStats {
                videos: 1,
                posts: 1,
                comments: 1,
                reactions: 1,
            })
        );
        assert!(stats.moderation.is_none());
    }

    #[tokio::test]
    async fn test_moderator_sees_moderation_counts() {
        let service = service_with(counts(&[2; 12]));

        let stats = service.get(&actor("m1", UserRole::Moderator)).await.unwrap();
        let moderation = stats.moderation.unwrap();
        assert_eq!(moderation.pending_reports, 2);
        assert_eq!(moderation.flagged_posts, 2);
    }
}
