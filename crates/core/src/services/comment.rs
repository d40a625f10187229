//! Comment service: threads, replies and the nested reply tree.

use std::collections::HashMap;

use commentable_common::{AppError, AppResult, Config, IdGenerator, Page, PageRequest};
use commentable_db::{
    entities::{
        EntityStatus,
        comment::{self, CommentableType},
        reaction::ReactionType,
    },
    repositories::{
        CommentFilter, CommentRepository, ParentFilter, ReactionRepository, UserRepository,
    },
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::commentable::CommentableResolver;
use super::reaction::ReactionSummary;
use crate::authorization::{Actor, Capability};
use crate::status::{self, Authority};

/// Input for creating a comment or a reply.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    pub commentable_type: CommentableType,
    pub commentable_id: String,
    pub parent_comment_id: Option<String>,
}

/// Input for editing a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentInput {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Listing filters for comments.
///
/// With a thread and no parent, only top-level comments are listed. Without
/// a thread, every level is.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentQuery {
    pub commentable_type: Option<CommentableType>,
    pub commentable_id: Option<String>,
    pub parent_comment_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<EntityStatus>,
}

/// A comment with what a reader needs to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub comment: comment::Model,
    pub author_username: Option<String>,
    pub author_name: Option<String>,
    pub reactions: ReactionSummary,
    /// The viewer's own reaction, if any.
    pub viewer_reaction: Option<ReactionType>,
}

/// A comment and its visible replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub view: CommentView,
    pub replies: Vec<CommentNode>,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    user_repo: UserRepository,
    reaction_repo: ReactionRepository,
    resolver: CommentableResolver,
    id_gen: IdGenerator,
    max_reply_depth: i32,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        user_repo: UserRepository,
        reaction_repo: ReactionRepository,
        resolver: CommentableResolver,
        config: &Config,
    ) -> Self {
        Self {
            comment_repo,
            user_repo,
            reaction_repo,
            resolver,
            id_gen: IdGenerator::new(),
            max_reply_depth: config.comments.max_reply_depth,
        }
    }

    /// Post a comment on a video or post, or a reply to another comment.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        let user_id = actor.require(Capability::CreateContent)?;
        input.validate()?;
        if input.content.trim().is_empty() {
            return Err(AppError::Validation("Comment content is blank".to_string()));
        }

        let target = self
            .resolver
            .resolve(input.commentable_type, &input.commentable_id)
            .await?;

        let depth = match input.parent_comment_id.as_deref() {
            None => 0,
            Some(parent_id) => {
                let parent = self
                    .comment_repo
                    .find_by_id(parent_id)
                    .await?
                    .filter(|p| p.status.is_visible())
                    .ok_or_else(|| AppError::NotFound(format!("Comment {parent_id}")))?;

                if parent.commentable_type != target.kind() || parent.commentable_id != target.id()
                {
                    return Err(AppError::Validation(
                        "A reply must belong to the same video or post as its parent".to_string(),
                    ));
                }

                let depth = parent.depth + 1;
                if depth > self.max_reply_depth {
                    return Err(AppError::Validation(format!(
                        "Replies cannot be nested deeper than {} levels",
                        self.max_reply_depth
                    )));
                }
                depth
            }
        };

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            content: Set(input.content),
            commentable_type: Set(target.kind()),
            commentable_id: Set(target.id().to_string()),
            parent_comment_id: Set(input.parent_comment_id),
            depth: Set(depth),
            reply_count: Set(0),
            reaction_count: Set(0),
            status: Set(EntityStatus::Active),
            ..Default::default()
        };

        let created = self.comment_repo.create(model).await?;
        tracing::info!(
            comment_id = %created.id,
            user_id,
            commentable_id = %created.commentable_id,
            depth,
            "Comment created"
        );
        Ok(created)
    }

    /// Get a comment with its annotations.
    pub async fn get(&self, actor: &Actor, id: &str) -> AppResult<CommentView> {
        let comment = self.find_for(actor, id).await?;
        self.annotate_one(actor, comment).await
    }

    /// Replace the content of one of the actor's visible comments.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        input: UpdateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;
        if input.content.trim().is_empty() {
            return Err(AppError::Validation("Comment content is blank".to_string()));
        }

        let comment = self.owned(actor, id).await?;
        if !comment.status.is_visible() {
            return Err(AppError::Conflict(format!(
                "Comment {id} is {:?} and cannot be edited",
                comment.status
            )));
        }

        self.comment_repo.update_content(comment, input.content).await
    }

    /// Soft-delete one of the actor's comments. Replies are kept.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<comment::Model> {
        let comment = self.owned(actor, id).await?;
        status::check(Authority::Owner, comment.status, EntityStatus::Deleted)?;

        let deleted = self.transition(comment, EntityStatus::Deleted).await?;
        tracing::info!(comment_id = %deleted.id, user_id = %deleted.user_id, "Comment deleted");
        Ok(deleted)
    }

    /// Apply a moderation transition.
    pub async fn set_status(
        &self,
        actor: &Actor,
        id: &str,
        to: EntityStatus,
    ) -> AppResult<comment::Model> {
        let moderator_id = actor.require(Capability::ModerateContent)?;
        let comment = self.comment_repo.get_by_id(id).await?;
        status::check(Authority::Moderator, comment.status, to)?;

        let updated = self.transition(comment, to).await?;
        tracing::info!(
            comment_id = %updated.id,
            moderator_id,
            status = ?to,
            "Comment status changed"
        );
        Ok(updated)
    }

    /// List comments.
    pub async fn list(
        &self,
        actor: &Actor,
        query: CommentQuery,
        request: &PageRequest,
    ) -> AppResult<Page<CommentView>> {
        let commentable = match (query.commentable_type, query.commentable_id) {
            (Some(kind), Some(id)) => Some((kind, id)),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "commentableType and commentableId must be given together".to_string(),
                ));
            }
        };

        let parent = match query.parent_comment_id {
            Some(parent_id) => ParentFilter::RepliesTo(parent_id),
            None if commentable.is_some() => ParentFilter::TopLevel,
            None => ParentFilter::Any,
        };

        let filter = CommentFilter {
            commentable,
            parent,
            user_id: query.user_id,
            statuses: actor.listable_statuses(query.status),
        };
        self.list_annotated(actor, &filter, request).await
    }

    /// Direct visible replies of a comment. Unknown parents yield an empty page.
    pub async fn replies(
        &self,
        actor: &Actor,
        id: &str,
        request: &PageRequest,
    ) -> AppResult<Page<CommentView>> {
        let filter = CommentFilter {
            parent: ParentFilter::RepliesTo(id.to_string()),
            ..Default::default()
        };
        self.list_annotated(actor, &filter, request).await
    }

    /// The visible subtree under a comment, down to the reply depth limit.
    pub async fn tree(&self, actor: &Actor, id: &str) -> AppResult<CommentNode> {
        let root = self.find_for(actor, id).await?;
        let thread = self
            .comment_repo
            .find_visible_in_thread(
                root.commentable_type,
                &root.commentable_id,
                root.depth,
                self.max_reply_depth,
            )
            .await?;

        let mut children: HashMap<String, Vec<comment::Model>> = HashMap::new();
        for comment in thread {
            if let Some(parent_id) = comment.parent_comment_id.clone() {
                children.entry(parent_id).or_default().push(comment);
            }
        }

        let mut subtree = vec![root.clone()];
        let mut frontier = vec![root.id.clone()];
        while let Some(parent_id) = frontier.pop() {
            for child in children.get(&parent_id).into_iter().flatten() {
                frontier.push(child.id.clone());
                subtree.push(child.clone());
            }
        }

        let mut views: HashMap<String, CommentView> = self
            .annotate(actor, subtree)
            .await?
            .into_iter()
            .map(|view| (view.comment.id.clone(), view))
            .collect();

        assemble(&root.id, &children, &mut views)
            .ok_or_else(|| {
                AppError::Internal(format!("Comment {id} vanished while building its tree"))
            })
    }

    async fn list_annotated(
        &self,
        actor: &Actor,
        filter: &CommentFilter,
        request: &PageRequest,
    ) -> AppResult<Page<CommentView>> {
        let (comments, meta) = self.comment_repo.list(filter, request).await?.into_parts();
        let views = self.annotate(actor, comments).await?;
        Ok(Page::with_items(views, &meta))
    }

    async fn annotate_one(&self, actor: &Actor, comment: comment::Model) -> AppResult<CommentView> {
        self.annotate(actor, vec![comment])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Annotating a comment lost it".to_string()))
    }

    /// Attach authors, reaction summaries and the viewer's reactions, with
    /// one query each for the whole batch.
    async fn annotate(
        &self,
        actor: &Actor,
        comments: Vec<comment::Model>,
    ) -> AppResult<Vec<CommentView>> {
        if comments.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = comments.iter().map(|c| c.id.clone()).collect();
        let mut author_ids: Vec<String> = comments.iter().map(|c| c.user_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();

        let authors: HashMap<String, _> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let mut summaries: HashMap<String, ReactionSummary> = HashMap::new();
        for tally in self.reaction_repo.tally_for_comments(&ids).await? {
            summaries
                .entry(tally.comment_id)
                .or_default()
                .add(tally.reaction_type, tally.count);
        }

        let mine: HashMap<String, ReactionType> = match actor.user_id.as_deref() {
            Some(user_id) => self
                .reaction_repo
                .find_by_user_for_comments(user_id, &ids)
                .await?
                .into_iter()
                .map(|r| (r.comment_id, r.reaction_type))
                .collect(),
            None => HashMap::new(),
        };

        Ok(comments
            .into_iter()
            .map(|comment| {
                let author = authors.get(&comment.user_id);
                CommentView {
                    author_username: author.map(|a| a.username.clone()),
                    author_name: author.map(|a| a.shown_name().to_string()),
                    reactions: summaries.get(&comment.id).copied().unwrap_or_default(),
                    viewer_reaction: mine.get(&comment.id).copied(),
                    comment,
                }
            })
            .collect())
    }

    /// A comment the actor may see, whatever its status.
    async fn find_for(&self, actor: &Actor, id: &str) -> AppResult<comment::Model> {
        self.comment_repo
            .find_by_id(id)
            .await?
            .filter(|c| actor.can_see(&c.user_id, c.status))
            .ok_or_else(|| AppError::NotFound(format!("Comment {id}")))
    }

    async fn owned(&self, actor: &Actor, id: &str) -> AppResult<comment::Model> {
        let user_id = actor.require(Capability::CreateContent)?;
        let comment = self.find_for(actor, id).await?;
        if comment.user_id != user_id {
            return Err(AppError::Forbidden("Not the author of this comment".to_string()));
        }
        Ok(comment)
    }

    async fn transition(
        &self,
        comment: comment::Model,
        to: EntityStatus,
    ) -> AppResult<comment::Model> {
        let id = comment.id.clone();
        self.comment_repo
            .transition_status(comment, to)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("Comment {id} was changed concurrently")))
    }
}

fn assemble(
    id: &str,
    children: &HashMap<String, Vec<comment::Model>>,
    views: &mut HashMap<String, CommentView>,
) -> Option<CommentNode> {
    let view = views.remove(id)?;
    let replies = children
        .get(id)
        .into_iter()
        .flatten()
        .filter_map(|child| assemble(&child.id, children, views))
        .collect();
    Some(CommentNode { view, replies })
}
