//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use commentable_common::{AppError, AppResult, IdGenerator};
use commentable_db::{
    entities::{
        EntityStatus,
        user::{self, UserRole},
    },
    repositories::UserRepository,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::authorization::{Actor, Capability};

#[allow(clippy::unwrap_used)]
static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// Input for registering a user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 30), regex(path = *USERNAME_RE))]
    pub username: String,

    #[validate(email, length(max = 254))]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 100))]
    pub display_name: Option<String>,

    #[validate(url, length(max = 2048))]
    pub avatar_url: Option<String>,

    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

/// A freshly registered user with their access token.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: user::Model,
    pub token: String,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user and issue their bearer token.
    pub async fn register(&self, input: RegisterInput) -> AppResult<Registration> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        let email = input.email.to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let token = self.id_gen.generate_token();

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username_lower: Set(input.username.to_lowercase()),
            username: Set(input.username),
            email: Set(email),
            password_hash: Set(password_hash),
            token: Set(Some(token.clone())),
            display_name: Set(input.display_name),
            avatar_url: Set(input.avatar_url),
            bio: Set(input.bio),
            role: Set(UserRole::User),
            status: Set(EntityStatus::Active),
            ..Default::default()
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(Registration { user, token })
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> AppResult<Option<user::Model>> {
        if token.is_empty() {
            return Ok(None);
        }
        self.user_repo.find_by_token(token).await
    }

    /// Change another user's role.
    pub async fn change_role(
        &self,
        actor: &Actor,
        user_id: &str,
        role: UserRole,
    ) -> AppResult<user::Model> {
        let admin_id = actor.require(Capability::AdministerUsers)?;
        if admin_id == user_id {
            return Err(AppError::BadRequest(
                "Administrators cannot change their own role".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        if user.role == role {
            return Ok(user);
        }

        let updated = self.user_repo.update_role(user, role).await?;
        tracing::info!(user_id = %updated.id, admin_id, role = ?role, "User role changed");
        Ok(updated)
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{actor, create_test_user};
    use argon2::{PasswordHash, PasswordVerifier};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn input(username: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: "Alice@Example.com".to_string(),
            password: "correct horse".to_string(),
            display_name: None,
            avatar_url: None,
            bio: None,
        }
    }

    #[test]
    fn test_hash_password_verifies() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
    }

    #[test]
    fn test_username_rules() {
        assert!(input("alice_01").validate().is_ok());
        assert!(input("al").validate().is_err());
        assert!(input("alice!").validate().is_err());
        assert!(input(&"a".repeat(31)).validate().is_err());
    }

    #[tokio::test]
    async fn test_register_issues_token() {
        let created = create_test_user("u1", UserRole::User);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[created]])
                .into_connection(),
        );
        let service = UserService::new(UserRepository::new(db));

        let registration = service.register(input("alice")).await.unwrap();
        assert_eq!(registration.token.len(), 32);
        assert_eq!(registration.user.id, "u1");
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u1", UserRole::User)]])
                .into_connection(),
        );
        let service = UserService::new(UserRepository::new(db));

        let result = service.register(input("alice")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_invalid_input_skips_storage() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = UserService::new(UserRepository::new(db));

        let result = service.register(input("x")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_change_role_requires_admin() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = UserService::new(UserRepository::new(db));

        let moderator = actor("m1", UserRole::Moderator);
        let result = service.change_role(&moderator, "u1", UserRole::Admin).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_change_role_updates_user() {
        let promoted = create_test_user("u1", UserRole::Moderator);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u1", UserRole::User)]])
                .append_query_results([[promoted]])
                .into_connection(),
        );
        let service = UserService::new(UserRepository::new(db));

        let admin = actor("a1", UserRole::Admin);
        let updated = service
            .change_role(&admin, "u1", UserRole::Moderator)
            .await
            .unwrap();
        assert_eq!(updated.role, UserRole::Moderator);
    }
}
