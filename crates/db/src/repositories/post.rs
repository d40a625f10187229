//! Post repository.

use std::sync::Arc;

use super::{map_write_err, paginate};
use crate::entities::{EntityStatus, Post, post};
use chrono::Utc;
use commentable_common::{AppError, AppResult, Page, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Select, prelude::DateTimeWithTimeZone, sea_query::Expr,
};

/// Filters for listing posts.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Substring matched against title and content.
    pub search: Option<String>,
    pub user_id: Option<String>,
    /// Allowed statuses. Empty means visible statuses.
    pub statuses: Vec<EntityStatus>,
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {id}")))
    }

    /// Find a post by its slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<post::Model>> {
        Post::find()
            .filter(post::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new post. A slug collision is a conflict.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_write_err(e, "Post slug"))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a post from the status it was read with to `to`.
    ///
    /// Fails with [`AppError::Conflict`] when the stored status has changed
    /// since `post` was read.
    pub async fn set_status(
        &self,
        post: post::Model,
        to: EntityStatus,
    ) -> AppResult<post::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = Post::update_many()
            .col_expr(post::Column::Status, Expr::value(to))
            .col_expr(post::Column::UpdatedAt, Expr::value(now))
            .filter(post::Column::Id.eq(post.id.as_str()))
            .filter(post::Column::Status.eq(post.status))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "Post {} changed status concurrently",
                post.id
            )));
        }

        Ok(post::Model {
            status: to,
            updated_at: now,
            ..post
        })
    }

    /// List posts matching `filter`.
    pub async fn list(
        &self,
        filter: &PostFilter,
        request: &PageRequest,
    ) -> AppResult<Page<post::Model>> {
        paginate(
            self.db.as_ref(),
            filtered(filter),
            sort_column(request.sort_by.as_deref()),
            post::Column::Id,
            request,
        )
        .await
    }

    /// Count posts matching `filter`.
    pub async fn count(&self, filter: &PostFilter) -> AppResult<u64> {
        filtered(filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment the view counter of a visible post.
    pub async fn record_view(&self, id: &str) -> AppResult<bool> {
        let result = Post::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.is_in(EntityStatus::VISIBLE))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

fn filtered(filter: &PostFilter) -> Select<Post> {
    let statuses = if filter.statuses.is_empty() {
        EntityStatus::VISIBLE.to_vec()
    } else {
        filter.statuses.clone()
    };

    let mut query = Post::find().filter(post::Column::Status.is_in(statuses));

    if let Some(user_id) = &filter.user_id {
        query = query.filter(post::Column::UserId.eq(user_id.as_str()));
    }

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(post::Column::Title.contains(search))
                .add(post::Column::Content.contains(search)),
        );
    }

    query
}

fn sort_column(sort_by: Option<&str>) -> post::Column {
    match sort_by.map(str::to_ascii_lowercase).as_deref() {
        Some("updatedat") => post::Column::UpdatedAt,
        Some("title") => post::Column::Title,
        Some("viewcount") => post::Column::ViewCount,
        Some("commentcount") => post::Column::CommentCount,
        Some("publishedat") => post::Column::PublishedAt,
        _ => post::Column::CreatedAt,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_post(id: &str, slug: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: "Hello".to_string(),
            content: "Body".to_string(),
            slug: slug.to_string(),
            featured_image_url: None,
            published_at: Some(Utc::now().into()),
            view_count: 0,
            comment_count: 0,
            status: EntityStatus::Active,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_sort_column_allow_list() {
        assert!(matches!(sort_column(Some("publishedAt")), post::Column::PublishedAt));
        assert!(matches!(sort_column(Some("updatedAt")), post::Column::UpdatedAt));
        assert!(matches!(sort_column(Some("content")), post::Column::CreatedAt));
    }

    #[tokio::test]
    async fn test_find_by_slug() {
        let post = create_test_post("p1", "hello-01abcdef");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let found = repo.find_by_slug("hello-01abcdef").await.unwrap().unwrap();
        assert_eq!(found.id, "p1");
    }

    #[tokio::test]
    async fn test_count_visible() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7))
                }]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert_eq!(repo.count(&PostFilter::default()).await.unwrap(), 7);
    }
}
