//! API integration tests.
//!
//! These drive the full router over a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::Utc;
use commentable_api::{AppState, app};
use commentable_common::Config;
use commentable_db::entities::{
    EntityStatus,
    comment::{self, CommentableType},
    reaction::{self, ReactionType},
    user::{self, UserRole},
};
use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, RuntimeErr, Value};
use serde_json::Value as Json;
use tower::ServiceExt;

fn test_app(db: MockDatabase) -> Router {
    let config = Config::for_database_url("postgres://localhost/test");
    app(AppState::new(Arc::new(db.into_connection()), config))
}

fn mock_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn create_test_user(id: &str, role: UserRole) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: format!("user_{id}"),
        username_lower: format!("user_{id}"),
        email: format!("{id}@example.com"),
        password_hash: String::new(),
        token: Some(format!("token-{id}")),
        display_name: None,
        avatar_url: None,
        bio: None,
        role,
        status: EntityStatus::Active,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

fn create_test_comment(id: &str, user_id: &str) -> comment::Model {
    comment::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        content: "Nice post".to_string(),
        commentable_type: CommentableType::Post,
        commentable_id: "p1".to_string(),
        parent_comment_id: None,
        depth: 0,
        reply_count: 0,
        reaction_count: 1,
        status: EntityStatus::Active,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    maplit::btreemap! { "num_items" => Value::BigInt(Some(n)) }
}

const fn exec_ok() -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: 1,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: Response) -> Json {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_pings_database() {
    let app = test_app(mock_db().append_exec_results([exec_ok()]));

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = test_app(mock_db());
    let response = app.oneshot(get("/api/nonexistent")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_me_without_token_is_unauthorized() {
    let app = test_app(mock_db());

    let response = app.oneshot(get("/api/users/me")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_me_with_token() {
    let app = test_app(mock_db().append_query_results([[create_test_user("u1", UserRole::User)]]));

    let request = Request::builder()
        .uri("/api/users/me")
        .header(header::AUTHORIZATION, "Bearer token-u1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], "user_u1");
    assert_eq!(body["data"]["role"], "User");
    assert_eq!(body["data"]["email"], "u1@example.com");
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_anonymous_comment_is_unauthorized() {
    let app = test_app(mock_db());

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/comments",
            None,
            r#"{"content":"hi","commentableType":"Post","commentableId":"p1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation_error() {
    let app = test_app(mock_db());

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/users",
            None,
            r#"{"username":"x!","email":"x@example.com","password":"long enough"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_comment_listing_envelope() {
    let app = test_app(mock_db().append_query_results([[count_row(0)]]));

    let response = app
        .oneshot(get("/api/comments?commentableType=Post&commentableId=p1&sortBy=replyCount"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let page = &body["data"];
    assert_eq!(page["items"], serde_json::json!([]));
    assert_eq!(page["page"], 1);
    assert_eq!(page["pageSize"], 20);
    assert_eq!(page["totalPages"], 0);
    assert_eq!(page["hasNextPage"], false);
    assert_eq!(page["hasPreviousPage"], false);
}

#[tokio::test]
async fn test_video_page_size_is_clamped() {
    let app = test_app(mock_db().append_query_results([[count_row(0)]]));

    let response = app
        .oneshot(get("/api/videos?pageSize=500&page=0"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["pageSize"], 100);
    assert_eq!(body["data"]["page"], 1);
}

#[tokio::test]
async fn test_posts_default_page_size() {
    let app = test_app(mock_db().append_query_results([[count_row(0)]]));

    let response = app.oneshot(get("/api/posts")).await.unwrap();

    let body = body_json(response).await;
    assert_eq!(body["data"]["pageSize"], 10);
}

#[tokio::test]
async fn test_reaction_toggle_off_returns_null() {
    let existing = reaction::Model {
        id: "r1".to_string(),
        user_id: "u2".to_string(),
        comment_id: "c1".to_string(),
        reaction_type: ReactionType::Like,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    };
    let app = test_app(
        mock_db()
            .append_query_results([[create_test_user("u2", UserRole::User)]])
            .append_query_results([[create_test_comment("c1", "u1")]])
            .append_query_results([[existing]])
            .append_exec_results([exec_ok(), exec_ok()]),
    );

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/reactions",
            Some("token-u2"),
            r#"{"commentId":"c1","reactionType":"Like"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"].is_null());
    assert!(body.get("data").is_some());
}

#[tokio::test]
async fn test_review_by_plain_user_is_forbidden() {
    let app = test_app(mock_db().append_query_results([[create_test_user("u1", UserRole::User)]]));

    let response = app
        .oneshot(send_json(
            "PUT",
            "/api/reports/r1/review",
            Some("token-u1"),
            r#"{"status":"Resolved"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_database_error_hides_details() {
    let app = test_app(
        mock_db().append_query_errors([DbErr::Query(RuntimeErr::Internal(
            "connection reset".to_string(),
        ))]),
    );

    let response = app.oneshot(get("/api/videos/v1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    assert_eq!(body["error"]["message"], "Internal server error");
}

#[tokio::test]
async fn test_stats_for_anonymous_viewer() {
    let app = test_app(
        mock_db()
            .append_query_results([[count_row(2)]])
            .append_query_results([[count_row(2)]])
            .append_query_results([[count_row(2)]])
            .append_query_results([[count_row(2)]]),
    );

    let response = app.oneshot(get("/api/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["totalComments"], 2);
    assert!(body["data"].get("moderation").is_none());
}

#[tokio::test]
async fn test_negative_page_clamps_to_first_page() {
    let app = test_app(mock_db().append_query_results([[count_row(0)]]));

    let response = app
        .oneshot(get("/api/videos?page=-1&pageSize=-3"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["pageSize"], 1);
}

#[tokio::test]
async fn test_far_page_returns_empty_page() {
    // Only the count runs; the slice is skipped past the end.
    let app = test_app(mock_db().append_query_results([[count_row(15)]]));

    let response = app
        .oneshot(get("/api/videos?page=9223372036854775807&pageSize=100"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["items"], serde_json::json!([]));
    assert_eq!(body["data"]["totalCount"], 15);
    assert_eq!(body["data"]["hasNextPage"], false);
}

#[tokio::test]
async fn test_unparsable_page_uses_error_envelope() {
    let app = test_app(mock_db());

    let response = app
        .oneshot(get("/api/videos?page=18446744073709551615"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_enum_filter_uses_error_envelope() {
    let app = test_app(mock_db());

    let response = app
        .oneshot(get("/api/reports?status=bogus"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_malformed_json_body_uses_error_envelope() {
    let app = test_app(mock_db());

    let response = app
        .oneshot(send_json("POST", "/api/users", None, "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}
