//! Repositories: all database access goes through these types.

mod comment;
mod post;
mod reaction;
mod report;
mod user;
mod video;

pub use comment::{CommentFilter, CommentRepository, ParentFilter};
pub use post::{PostFilter, PostRepository};
pub use reaction::{ReactionFilter, ReactionRepository, ReactionTally};
pub use report::{CommentEffect, ReportFilter, ReportRepository};
pub use user::UserRepository;
pub use video::{VideoFilter, VideoRepository};

use commentable_common::{AppError, AppResult, Page, PageRequest, SortOrder};
use sea_orm::{
    ConnectionTrait, DbErr, EntityTrait, Order, PaginatorTrait, QueryOrder, Select, SqlErr,
};

/// Map a write error, turning unique-index violations into [`AppError::Conflict`].
pub(crate) fn map_write_err(err: DbErr, what: &str) -> AppError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        AppError::Conflict(format!("{what} already exists"))
    } else {
        AppError::Database(err.to_string())
    }
}

pub(crate) const fn order(sort_order: SortOrder) -> Order {
    match sort_order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

/// Sort, count and slice a filtered query.
///
/// The same `query` value feeds both the count and the page fetch, so the
/// total always matches the filters applied to the items. `tie_breaker`
/// keeps the order stable between pages when sort keys collide.
pub(crate) async fn paginate<E, C>(
    conn: &C,
    query: Select<E>,
    sort_column: E::Column,
    tie_breaker: E::Column,
    request: &PageRequest,
) -> AppResult<Page<E::Model>>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
    C: ConnectionTrait,
{
    let direction = order(request.sort_order);
    let paginator = query
        .order_by(sort_column, direction.clone())
        .order_by(tie_breaker, direction)
        .paginate(conn, request.page_size);

    let total = paginator
        .num_items()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if total <= request.offset() {
        return Ok(Page::new(Vec::new(), request, total));
    }

    let items = paginator
        .fetch_page(request.page_index())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Page::new(items, request, total))
}
