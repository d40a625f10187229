//! Status transitions for videos, posts and comments.

use commentable_common::{AppError, AppResult};
use commentable_db::entities::EntityStatus;

/// On whose behalf a status change is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// The content's owner.
    Owner,
    /// A moderator, an admin or report escalation.
    Moderator,
}

/// Whether `authority` may move content from `from` to `to`.
#[must_use]
pub const fn is_allowed(authority: Authority, from: EntityStatus, to: EntityStatus) -> bool {
    use EntityStatus::{Active, Deleted, Flagged, Removed};

    match authority {
        Authority::Owner => matches!((from, to), (Active | Flagged, Deleted)),
        Authority::Moderator => matches!(
            (from, to),
            (Active, Flagged) | (Flagged, Active) | (Flagged | Active, Removed)
        ),
    }
}

/// Check a transition, failing with [`AppError::Conflict`] when it is not allowed.
pub fn check(authority: Authority, from: EntityStatus, to: EntityStatus) -> AppResult<()> {
    if is_allowed(authority, from, to) {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "Cannot change status from {from:?} to {to:?}"
        )))
    }
}
