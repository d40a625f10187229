//! Role-based authorization.
//!
//! [`capabilities`] is the single table mapping roles to what they may do.
//! Every gated operation receives an explicit [`Actor`] and asks it via
//! [`Actor::require`].

use commentable_common::{AppError, AppResult};
use commentable_db::entities::{EntityStatus, user};

pub use commentable_db::entities::user::UserRole;

/// Something a role may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read visible content.
    ViewContent,
    /// Create videos, posts and comments, and edit or delete one's own.
    CreateContent,
    React,
    Report,
    /// Flag, restore or remove any video, post or comment.
    ModerateContent,
    ReviewReports,
    /// Change other users' roles.
    AdministerUsers,
}

const GUEST: &[Capability] = &[Capability::ViewContent];

const USER: &[Capability] = &[
    Capability::ViewContent,
    Capability::CreateContent,
    Capability::React,
    Capability::Report,
];

const MODERATOR: &[Capability] = &[
    Capability::ViewContent,
    Capability::CreateContent,
    Capability::React,
    Capability::Report,
    Capability::ModerateContent,
    Capability::ReviewReports,
];

const ADMIN: &[Capability] = &[
    Capability::ViewContent,
    Capability::CreateContent,
    Capability::React,
    Capability::Report,
    Capability::ModerateContent,
    Capability::ReviewReports,
    Capability::AdministerUsers,
];

/// Capabilities granted to `role`.
#[must_use]
pub const fn capabilities(role: UserRole) -> &'static [Capability] {
    match role {
        UserRole::Guest => GUEST,
        UserRole::User => USER,
        UserRole::Moderator => MODERATOR,
        UserRole::Admin => ADMIN,
    }
}

/// The caller of a core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// `None` for anonymous callers.
    pub user_id: Option<String>,
    pub role: UserRole,
}

impl Actor {
    /// An anonymous caller.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            user_id: None,
            role: UserRole::Guest,
        }
    }

    /// An authenticated caller. Users who are not active keep only guest rights.
    #[must_use]
    pub fn from_user(user: &user::Model) -> Self {
        let role = if user.status == EntityStatus::Active {
            user.role
        } else {
            UserRole::Guest
        };
        Self {
            user_id: Some(user.id.clone()),
            role,
        }
    }

    /// Build an actor from an optional authenticated user.
    #[must_use]
    pub fn from_optional(user: Option<&user::Model>) -> Self {
        user.map_or_else(Self::anonymous, Self::from_user)
    }

    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        capabilities(self.role).contains(&capability)
    }

    /// Whether this actor is the user `user_id`.
    #[must_use]
    pub fn is(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }

    /// Whether this actor may see content owned by `owner_id` in `status`.
    ///
    /// Hidden content stays visible to its owner and to moderators.
    #[must_use]
    pub fn can_see(&self, owner_id: &str, status: EntityStatus) -> bool {
        status.is_visible() || self.is(owner_id) || self.can(Capability::ModerateContent)
    }

    /// Statuses to list given a requested status filter. Only moderators may
    /// look past visible content.
    #[must_use]
    pub fn listable_statuses(&self, requested: Option<EntityStatus>) -> Vec<EntityStatus> {
        match requested {
            Some(status) if self.can(Capability::ModerateContent) => vec![status],
            Some(status) if status.is_visible() => vec![status],
            _ => Vec::new(),
        }
    }

    /// Require `capability`, returning the caller's user ID.
    ///
    /// Anonymous callers get [`AppError::Unauthorized`]; authenticated callers
    /// without the capability get [`AppError::Forbidden`].
    pub fn require(&self, capability: Capability) -> AppResult<&str> {
        let Some(user_id) = self.user_id.as_deref() else {
            return Err(AppError::Unauthorized);
        };
        if self.can(capability) {
            Ok(user_id)
        } else {
            Err(AppError::Forbidden(format!(
                "{:?} cannot {capability:?}",
                self.role
            )))
        }
    }
}
