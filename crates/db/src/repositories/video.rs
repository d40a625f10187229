//! Video repository.

use std::sync::Arc;

use super::paginate;
use crate::entities::{EntityStatus, Video, video};
use chrono::Utc;
use commentable_common::{AppError, AppResult, Page, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Select, prelude::DateTimeWithTimeZone, sea_query::Expr,
};

/// Filters for listing videos.
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    /// Substring matched against title and description.
    pub search: Option<String>,
    /// Only videos owned by this user.
    pub user_id: Option<String>,
    /// Allowed statuses. Empty means visible statuses.
    pub statuses: Vec<EntityStatus>,
}

/// Video repository for database operations.
#[derive(Clone)]
pub struct VideoRepository {
    db: Arc<DatabaseConnection>,
}

impl VideoRepository {
    /// Create a new video repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a video by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<video::Model>> {
        Video::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a video by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<video::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {id}")))
    }

    /// Create a new video.
    pub async fn create(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a video.
    pub async fn update(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a video from the status it was read with to `to`.
    ///
    /// Fails with [`AppError::Conflict`] when the stored status has changed
    /// since `video` was read.
    pub async fn set_status(
        &self,
        video: video::Model,
        to: EntityStatus,
    ) -> AppResult<video::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = Video::update_many()
            .col_expr(video::Column::Status, Expr::value(to))
            .col_expr(video::Column::UpdatedAt, Expr::value(now))
            .filter(video::Column::Id.eq(video.id.as_str()))
            .filter(video::Column::Status.eq(video.status))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "Video {} changed status concurrently",
                video.id
            )));
        }

        Ok(video::Model {
            status: to,
            updated_at: now,
            ..video
        })
    }

    /// List videos matching `filter`.
    pub async fn list(
        &self,
        filter: &VideoFilter,
        request: &PageRequest,
    ) -> AppResult<Page<video::Model>> {
        paginate(
            self.db.as_ref(),
            filtered(filter),
            sort_column(request.sort_by.as_deref()),
            video::Column::Id,
            request,
        )
        .await
    }

    /// Count videos matching `filter`.
    pub async fn count(&self, filter: &VideoFilter) -> AppResult<u64> {
        filtered(filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment the view counter of a visible video. Returns whether a row was updated.
    pub async fn record_view(&self, id: &str) -> AppResult<bool> {
        let result = Video::update_many()
            .col_expr(
                video::Column::ViewCount,
                Expr::col(video::Column::ViewCount).add(1),
            )
            .filter(video::Column::Id.eq(id))
            .filter(video::Column::Status.is_in(EntityStatus::VISIBLE))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

fn filtered(filter: &VideoFilter) -> Select<Video> {
    let statuses = if filter.statuses.is_empty() {
        EntityStatus::VISIBLE.to_vec()
    } else {
        filter.statuses.clone()
    };

    let mut query = Video::find().filter(video::Column::Status.is_in(statuses));

    if let Some(user_id) = &filter.user_id {
        query = query.filter(video::Column::UserId.eq(user_id.as_str()));
    }

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(video::Column::Title.contains(search))
                .add(video::Column::Description.contains(search)),
        );
    }

    query
}

/// Resolve a client `sortBy` value. Unknown fields sort by creation time.
fn sort_column(sort_by: Option<&str>) -> video::Column {
    match sort_by.map(str::to_ascii_lowercase).as_deref() {
        Some("updatedat") => video::Column::UpdatedAt,
        Some("title") => video::Column::Title,
        Some("viewcount") => video::Column::ViewCount,
        Some("commentcount") => video::Column::CommentCount,
        _ => video::Column::CreatedAt,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use commentable_common::PageQuery;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_video(id: &str, user_id: &str, title: &str) -> video::Model {
        video::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: None,
            video_url: format!("https://cdn.example.com/{id}.mp4"),
            thumbnail_url: None,
            duration: 120,
            view_count: 0,
            comment_count: 0,
            status: EntityStatus::Active,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_sort_column_allow_list() {
        assert!(matches!(sort_column(Some("viewCount")), video::Column::ViewCount));
        assert!(matches!(sort_column(Some("TITLE")), video::Column::Title));
        assert!(matches!(sort_column(Some("duration")), video::Column::CreatedAt));
        assert!(matches!(sort_column(None), video::Column::CreatedAt));
    }

    #[tokio::test]
    async fn test_list_counts_then_fetches() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .append_query_results([[
                    create_test_video("v1", "u1", "First"),
                    create_test_video("v2", "u1", "Second"),
                ]])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let request = PageRequest::resolve(
            &PageQuery {
                page_size: Some(2),
                ..Default::default()
            },
            12,
            100,
        );
        let page = repo.list(&VideoFilter::default(), &request).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_next_page);
    }

    #[tokio::test]
    async fn test_list_past_the_end_skips_fetch() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let request = PageRequest::resolve(
            &PageQuery {
                page: Some(4),
                ..Default::default()
            },
            12,
            100,
        );
        let page = repo.list(&VideoFilter::default(), &request).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 1);
        assert!(page.has_previous_page);
    }

    #[tokio::test]
    async fn test_record_view() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        assert!(repo.record_view("v1").await.unwrap());
    }
}
