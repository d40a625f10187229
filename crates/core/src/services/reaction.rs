//! Reaction service.
//!
//! A user has at most one reaction per comment. Posting the same type again
//! removes it; posting another type changes it in place.

use commentable_common::{AppError, AppResult, IdGenerator, Page, PageRequest};
use commentable_db::{
    entities::reaction::{self, ReactionType},
    repositories::{CommentRepository, ReactionFilter, ReactionRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::authorization::{Actor, Capability};

/// Reaction counts per type for one comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub like: i64,
    pub dislike: i64,
    pub love: i64,
    pub clap: i64,
    pub laugh: i64,
    pub sad: i64,
    pub total: i64,
}

impl ReactionSummary {
    /// Add `count` reactions of `reaction_type`.
    pub fn add(&mut self, reaction_type: ReactionType, count: i64) {
        let slot = match reaction_type {
            ReactionType::Like => &mut self.like,
            ReactionType::Dislike => &mut self.dislike,
            ReactionType::Love => &mut self.love,
            ReactionType::Clap => &mut self.clap,
            ReactionType::Laugh => &mut self.laugh,
            ReactionType::Sad => &mut self.sad,
        };
        *slot += count;
        self.total += count;
    }
}

/// Input for reacting to a comment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertReactionInput {
    pub comment_id: String,
    pub reaction_type: ReactionType,
}

/// Listing filters for reactions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionQuery {
    pub comment_id: Option<String>,
    pub user_id: Option<String>,
    pub reaction_type: Option<ReactionType>,
}

/// What an upsert does given the user's current reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertPlan {
    Create,
    /// Same type posted again: toggle off.
    Remove,
    Change,
}

/// Decide what posting `requested` does when `existing` is the current reaction.
#[must_use]
pub fn plan_upsert(existing: Option<ReactionType>, requested: ReactionType) -> UpsertPlan {
    match existing {
        None => UpsertPlan::Create,
        Some(current) if current == requested => UpsertPlan::Remove,
        Some(_) => UpsertPlan::Change,
    }
}

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService {
    reaction_repo: ReactionRepository,
    comment_repo: CommentRepository,
    id_gen: IdGenerator,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub const fn new(reaction_repo: ReactionRepository, comment_repo: CommentRepository) -> Self {
        Self {
            reaction_repo,
            comment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// React to a comment. Returns the resulting reaction, or `None` when
    /// the call toggled an existing reaction off.
    pub async fn upsert(
        &self,
        actor: &Actor,
        input: UpsertReactionInput,
    ) -> AppResult<Option<reaction::Model>> {
        let user_id = actor.require(Capability::React)?;
        self.visible_comment(&input.comment_id).await?;

        let existing = self
            .reaction_repo
            .find_by_user_and_comment(user_id, &input.comment_id)
            .await?;

        let plan = plan_upsert(existing.as_ref().map(|r| r.reaction_type), input.reaction_type);
        match (plan, existing) {
            (UpsertPlan::Remove, Some(current)) => {
                self.reaction_repo.delete(&current).await?;
                tracing::info!(comment_id = %current.comment_id, user_id, "Reaction removed");
                Ok(None)
            }
            (UpsertPlan::Change, Some(current)) => {
                let changed = self
                    .reaction_repo
                    .change_type(current, input.reaction_type)
                    .await?;
                Ok(Some(changed))
            }
            _ => self.create(user_id, input).await.map(Some),
        }
    }

    /// Insert a new reaction. Losing an insert race to a concurrent request
    /// by the same user turns into updating the row that won.
    async fn create(
        &self,
        user_id: &str,
        input: UpsertReactionInput,
    ) -> AppResult<reaction::Model> {
        let model = reaction::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            comment_id: Set(input.comment_id.clone()),
            reaction_type: Set(input.reaction_type),
            ..Default::default()
        };

        match self.reaction_repo.create(model).await {
            Ok(created) => {
                tracing::info!(comment_id = %created.comment_id, user_id, "Reaction added");
                Ok(created)
            }
            Err(AppError::Conflict(_)) => self.adopt_racing_reaction(user_id, &input).await,
            Err(e) => Err(e),
        }
    }

    /// Point the row that won a concurrent insert at the requested type.
    async fn adopt_racing_reaction(
        &self,
        user_id: &str,
        input: &UpsertReactionInput,
    ) -> AppResult<reaction::Model> {
        tracing::debug!(
            comment_id = %input.comment_id,
            user_id,
            "Reaction insert raced, updating instead"
        );
        let winner = self
            .reaction_repo
            .find_by_user_and_comment(user_id, &input.comment_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Reaction changed concurrently, try again".to_string())
            })?;

        if winner.reaction_type == input.reaction_type {
            Ok(winner)
        } else {
            self.reaction_repo
                .change_type(winner, input.reaction_type)
                .await
        }
    }

    /// List reactions.
    pub async fn list(
        &self,
        query: ReactionQuery,
        request: &PageRequest,
    ) -> AppResult<Page<reaction::Model>> {
        let filter = ReactionFilter {
            comment_id: query.comment_id,
            user_id: query.user_id,
            reaction_type: query.reaction_type,
        };
        self.reaction_repo.list(&filter, request).await
    }

    /// Per-type counts for a visible comment.
    pub async fn summary(&self, comment_id: &str) -> AppResult<ReactionSummary> {
        self.visible_comment(comment_id).await?;

        let mut summary = ReactionSummary::default();
        for tally in self
            .reaction_repo
            .tally_for_comments(&[comment_id.to_string()])
            .await?
        {
            summary.add(tally.reaction_type, tally.count);
        }
        Ok(summary)
    }

    /// Delete one of the actor's reactions.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<()> {
        let user_id = actor.require(Capability::React)?;
        let reaction = self.reaction_repo.get_by_id(id).await?;
        if reaction.user_id != user_id {
            return Err(AppError::Forbidden("Not the owner of this reaction".to_string()));
        }

        if !self.reaction_repo.delete(&reaction).await? {
            return Err(AppError::NotFound(format!("Reaction {id}")));
        }
        tracing::info!(reaction_id = id, user_id, "Reaction deleted");
        Ok(())
    }

    async fn visible_comment(&self, comment_id: &str) -> AppResult<()> {
        self.comment_repo
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.status.is_visible())
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Comment {comment_id}")))
    }
}
