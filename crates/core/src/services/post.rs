//! Post service.

use chrono::Utc;
use commentable_common::{AppError, AppResult, IdGenerator, Page, PageRequest};
use commentable_db::{
    entities::{EntityStatus, post},
    repositories::{PostFilter, PostRepository},
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use validator::Validate;

use crate::authorization::{Actor, Capability};
use crate::status::{self, Authority};

/// Longest slug stem taken from a title.
const MAX_SLUG_STEM: usize = 80;

#[allow(clippy::unwrap_used)]
static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Input for creating a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 50000))]
    pub content: String,

    #[validate(url, length(max = 2048))]
    pub featured_image_url: Option<String>,
}

/// Input for updating a post. The slug never changes.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 50000))]
    pub content: Option<String>,

    #[validate(url, length(max = 2048))]
    pub featured_image_url: Option<String>,
}

/// Listing filters for posts.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
    pub search: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<EntityStatus>,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl PostService {
    pub const DEFAULT_PAGE_SIZE: u64 = 10;

    /// Create a new post service.
    #[must_use]
    pub const fn new(post_repo: PostRepository) -> Self {
        Self {
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish a post owned by the actor.
    pub async fn create(&self, actor: &Actor, input: CreatePostInput) -> AppResult<post::Model> {
        let user_id = actor.require(Capability::CreateContent)?;
        input.validate()?;

        let slug = self.unique_slug(&input.title).await?;
        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            title: Set(input.title),
            content: Set(input.content),
            slug: Set(slug),
            featured_image_url: Set(input.featured_image_url),
            published_at: Set(Some(Utc::now().into())),
            view_count: Set(0),
            comment_count: Set(0),
            status: Set(EntityStatus::Active),
            ..Default::default()
        };

        let post = self.post_repo.create(model).await?;
        tracing::info!(post_id = %post.id, slug = %post.slug, user_id, "Post created");
        Ok(post)
    }

    /// Get a post the actor is allowed to see.
    pub async fn get(&self, actor: &Actor, id: &str) -> AppResult<post::Model> {
        self.post_repo
            .find_by_id(id)
            .await?
            .filter(|p| actor.can_see(&p.user_id, p.status))
            .ok_or_else(|| AppError::NotFound(format!("Post {id}")))
    }

    /// Get a post by its slug.
    pub async fn get_by_slug(&self, actor: &Actor, slug: &str) -> AppResult<post::Model> {
        self.post_repo
            .find_by_slug(slug)
            .await?
            .filter(|p| actor.can_see(&p.user_id, p.status))
            .ok_or_else(|| AppError::NotFound(format!("Post {slug}")))
    }

    /// Edit one of the actor's visible posts.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        input: UpdatePostInput,
    ) -> AppResult<post::Model> {
        input.validate()?;
        let post = self.owned(actor, id).await?;
        if !post.status.is_visible() {
            return Err(AppError::Conflict(format!(
                "Post {id} is {:?} and cannot be edited",
                post.status
            )));
        }

        let mut active = post.into_active_model();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(url) = input.featured_image_url {
            active.featured_image_url = Set(Some(url));
        }

        self.post_repo.update(active).await
    }

    /// Soft-delete one of the actor's posts.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<post::Model> {
        let post = self.owned(actor, id).await?;
        status::check(Authority::Owner, post.status, EntityStatus::Deleted)?;

        let deleted = self.post_repo.set_status(post, EntityStatus::Deleted).await?;
        tracing::info!(post_id = %deleted.id, user_id = %deleted.user_id, "Post deleted");
        Ok(deleted)
    }

    /// Apply a moderation transition.
    pub async fn set_status(
        &self,
        actor: &Actor,
        id: &str,
        to: EntityStatus,
    ) -> AppResult<post::Model> {
        let moderator_id = actor.require(Capability::ModerateContent)?;
        let post = self.post_repo.get_by_id(id).await?;
        status::check(Authority::Moderator, post.status, to)?;

        let updated = self.post_repo.set_status(post, to).await?;
        tracing::info!(post_id = %updated.id, moderator_id, status = ?to, "Post status changed");
        Ok(updated)
    }

    /// List posts.
    pub async fn list(
        &self,
        actor: &Actor,
        query: PostQuery,
        request: &PageRequest,
    ) -> AppResult<Page<post::Model>> {
        let filter = PostFilter {
            search: query.search.filter(|s| !s.trim().is_empty()),
            user_id: query.user_id,
            statuses: actor.listable_statuses(query.status),
        };
        self.post_repo.list(&filter, request).await
    }

    /// Count one view of a visible post.
    pub async fn record_view(&self, id: &str) -> AppResult<()> {
        if self.post_repo.record_view(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Post {id}")))
        }
    }

    async fn owned(&self, actor: &Actor, id: &str) -> AppResult<post::Model> {
        let user_id = actor.require(Capability::CreateContent)?;
        let post = self.get(actor, id).await?;
        if post.user_id != user_id {
            return Err(AppError::Forbidden("Not the owner of this post".to_string()));
        }
        Ok(post)
    }

    /// Slug for `title`, suffixed when the plain form is taken.
    async fn unique_slug(&self, title: &str) -> AppResult<String> {
        let stem = slugify(title);
        if self.post_repo.find_by_slug(&stem).await?.is_none() {
            return Ok(stem);
        }
        Ok(format!("{stem}-{}", self.id_gen.generate_suffix()))
    }
}

/// Lowercase ASCII words of `title` joined by dashes.
fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let dashed = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let mut slug: String = dashed.trim_matches('-').chars().take(MAX_SLUG_STEM).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "post".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{actor, create_test_post, exec_ok};
    use commentable_db::entities::user::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service_with(db: MockDatabase) -> PostService {
        PostService::new(PostRepository::new(Arc::new(db.into_connection())))
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust & SeaORM 1.1 "), "rust-seaorm-1-1");
        assert_eq!(slugify("???"), "post");
        assert_eq!(slugify("日本語"), "post");
        assert!(slugify(&"word ".repeat(40)).len() <= MAX_SLUG_STEM);
        assert!(!slugify(&"word ".repeat(40)).ends_with('-'));
    }

    #[tokio::test]
    async fn test_create_uses_plain_slug_when_free() {
        let mut created = create_test_post("p1", "u1");
        created.slug = "hello-world".to_string();
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .append_query_results([[created]]),
        );

        let post = service
            .create(
                &actor("u1", UserRole::User),
                CreatePostInput {
                    title: "Hello, World".to_string(),
                    content: "Body".to_string(),
                    featured_image_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(post.slug, "hello-world");
    }

    #[tokio::test]
    async fn test_unique_slug_adds_suffix_when_taken() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p0", "u2")]]),
        );

        let slug = service.unique_slug("Test post").await.unwrap();
        assert!(slug.starts_with("test-post-"));
        assert_eq!(slug.len(), "test-post-".len() + 8);
    }

    #[tokio::test]
    async fn test_get_by_slug_hides_deleted_post() {
        let mut post = create_test_post("p1", "u1");
        post.status = EntityStatus::Deleted;
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[post]]),
        );

        let result = service.get_by_slug(&Actor::anonymous(), "test-post-p1").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_owner_delete() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "u1")]])
                .append_exec_results([exec_ok(1)]),
        );

        let result = service.delete(&actor("u1", UserRole::User), "p1").await.unwrap();
        assert_eq!(result.status, EntityStatus::Deleted);
    }

    #[tokio::test]
    async fn test_delete_losing_to_moderator_removal_conflicts() {
        // The status guard matches no row: a moderator removed the post first.
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "u1")]])
                .append_exec_results([exec_ok(0)]),
        );

        let result = service.delete(&actor("u1", UserRole::User), "p1").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_user_cannot_moderate() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));
        let result = service
            .set_status(&actor("u1", UserRole::User), "p1", EntityStatus::Removed)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
