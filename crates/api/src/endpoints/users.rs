//! Users endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use commentable_common::AppResult;
use commentable_core::{RegisterInput, UserRole};
use commentable_db::entities::{EntityStatus, user};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, CurrentActor, Json},
    middleware::AppState,
    response::ApiResponse,
};

/// User response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub role: UserRole,
    pub status: EntityStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            bio: user.bio,
            role: user.role,
            status: user.status,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// The caller's own account, including private fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub email: String,
}

/// Registration response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user: MeResponse,
    /// Bearer token for the `Authorization` header.
    pub token: String,
}

/// Change role request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleRequest {
    pub role: UserRole,
}

fn me_response(user: user::Model) -> MeResponse {
    let email = user.email.clone();
    MeResponse {
        user: user.into(),
        email,
    }
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let registration = state.user_service.register(input).await?;
    Ok(ApiResponse::created(RegisterResponse {
        user: me_response(registration.user),
        token: registration.token,
    }))
}

/// Get current user.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<MeResponse> {
    ApiResponse::ok(me_response(user))
}

/// Get a user by ID.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Change a user's role.
async fn change_role(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChangeRoleRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.change_role(&actor, &id, req.role).await?;
    Ok(ApiResponse::ok(user.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route("/me", get(me))
        .route("/{id}", get(show))
        .route("/{id}/role", put(change_role))
}
