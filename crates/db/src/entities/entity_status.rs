//! Moderation status shared by users, videos, posts and comments.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a user or a piece of content.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntityStatus {
    /// Normal, visible content.
    #[sea_orm(string_value = "active")]
    #[default]
    Active,
    /// Soft deleted by its owner.
    #[sea_orm(string_value = "deleted")]
    Deleted,
    /// Still visible, queued for moderator attention.
    #[sea_orm(string_value = "flagged")]
    Flagged,
    /// Taken down by a moderator.
    #[sea_orm(string_value = "removed")]
    Removed,
}

impl EntityStatus {
    /// Statuses that appear in normal listings.
    pub const VISIBLE: [Self; 2] = [Self::Active, Self::Flagged];

    /// Whether content in this status is shown to ordinary viewers.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Active | Self::Flagged)
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Deleted | Self::Removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_visibility() {
        assert!(EntityStatus::Active.is_visible());
        assert!(EntityStatus::Flagged.is_visible());
        assert!(!EntityStatus::Deleted.is_visible());
        assert!(!EntityStatus::Removed.is_visible());
    }

    #[test]
    fn test_visible_matches_is_visible() {
        for status in EntityStatus::iter() {
            assert_eq!(EntityStatus::VISIBLE.contains(&status), status.is_visible());
            assert_eq!(status.is_terminal(), !status.is_visible());
        }
    }

    #[test]
    fn test_json_uses_variant_names() {
        assert_eq!(
            serde_json::to_string(&EntityStatus::Flagged).unwrap(),
            "\"Flagged\""
        );
    }
}
