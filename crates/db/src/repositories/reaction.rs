//! Reaction repository.

use std::sync::Arc;

use super::{map_write_err, paginate};
use crate::entities::{
    Comment, Reaction, comment,
    reaction::{self, ReactionType},
};
use commentable_common::{AppError, AppResult, Page, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, IntoActiveModel, PaginatorTrait, QueryFilter, QuerySelect, Select, Set,
    TransactionTrait, sea_query::Expr,
};

/// Filters for listing reactions.
#[derive(Debug, Clone, Default)]
pub struct ReactionFilter {
    pub comment_id: Option<String>,
    pub user_id: Option<String>,
    pub reaction_type: Option<ReactionType>,
}

/// Number of reactions of one type on one comment.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ReactionTally {
    pub comment_id: String,
    pub reaction_type: ReactionType,
    pub count: i64,
}

/// Reaction repository for database operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a reaction by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<reaction::Model>> {
        Reaction::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a reaction by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<reaction::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reaction {id}")))
    }

    /// Find a reaction by user and comment.
    pub async fn find_by_user_and_comment(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> AppResult<Option<reaction::Model>> {
        Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::CommentId.eq(comment_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's reactions on any of `comment_ids`.
    pub async fn find_by_user_for_comments(
        &self,
        user_id: &str,
        comment_ids: &[String],
    ) -> AppResult<Vec<reaction::Model>> {
        if comment_ids.is_empty() {
            return Ok(vec![]);
        }

        Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::CommentId.is_in(comment_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a reaction and bump the comment's `reaction_count`.
    ///
    /// A second reaction by the same user on the same comment violates the
    /// unique index and comes back as [`AppError::Conflict`].
    pub async fn create(&self, model: reaction::ActiveModel) -> AppResult<reaction::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = model
            .insert(&txn)
            .await
            .map_err(|e| map_write_err(e, "Reaction"))?;

        adjust_reaction_count(&txn, &created.comment_id, 1)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Change the type of an existing reaction, keeping its ID.
    pub async fn change_type(
        &self,
        reaction: reaction::Model,
        reaction_type: ReactionType,
    ) -> AppResult<reaction::Model> {
        let mut active = reaction.into_active_model();
        active.reaction_type = Set(reaction_type);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a reaction and decrement the comment's `reaction_count`.
    ///
    /// Returns whether a row was deleted.
    pub async fn delete(&self, reaction: &reaction::Model) -> AppResult<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = Reaction::delete_by_id(reaction.id.as_str())
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let deleted = result.rows_affected > 0;
        if deleted {
            adjust_reaction_count(&txn, &reaction.comment_id, -1)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(deleted)
    }

    /// List reactions matching `filter`, newest first unless asked otherwise.
    pub async fn list(
        &self,
        filter: &ReactionFilter,
        request: &PageRequest,
    ) -> AppResult<Page<reaction::Model>> {
        let sort = match request.sort_by.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("updatedat") => reaction::Column::UpdatedAt,
            _ => reaction::Column::CreatedAt,
        };

        paginate(
            self.db.as_ref(),
            filtered(filter),
            sort,
            reaction::Column::Id,
            request,
        )
        .await
    }

    /// Count reactions matching `filter`.
    pub async fn count(&self, filter: &ReactionFilter) -> AppResult<u64> {
        filtered(filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Per-type reaction counts for each of `comment_ids`, in one grouped query.
    pub async fn tally_for_comments(
        &self,
        comment_ids: &[String],
    ) -> AppResult<Vec<ReactionTally>> {
        if comment_ids.is_empty() {
            return Ok(vec![]);
        }

        Reaction::find()
            .select_only()
            .column(reaction::Column::CommentId)
            .column(reaction::Column::ReactionType)
            .column_as(Expr::col(reaction::Column::Id).count(), "count")
            .filter(reaction::Column::CommentId.is_in(comment_ids.to_vec()))
            .group_by(reaction::Column::CommentId)
            .group_by(reaction::Column::ReactionType)
            .into_model::<ReactionTally>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

async fn adjust_reaction_count<C>(conn: &C, comment_id: &str, delta: i32) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    Comment::update_many()
        .col_expr(
            comment::Column::ReactionCount,
            Expr::col(comment::Column::ReactionCount).add(delta),
        )
        .filter(comment::Column::Id.eq(comment_id))
        .exec(conn)
        .await?;
    Ok(())
}

fn filtered(filter: &ReactionFilter) -> Select<Reaction> {
    let mut query = Reaction::find();

    if let Some(comment_id) = &filter.comment_id {
        query = query.filter(reaction::Column::CommentId.eq(comment_id.as_str()));
    }
    if let Some(user_id) = &filter.user_id {
        query = query.filter(reaction::Column::UserId.eq(user_id.as_str()));
    }
    if let Some(reaction_type) = filter.reaction_type {
        query = query.filter(reaction::Column::ReactionType.eq(reaction_type));
    }

    query
}
