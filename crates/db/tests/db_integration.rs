//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `commentable_test`)
//!   `TEST_DB_PASSWORD` (default: `commentable_test`)
//!   `TEST_DB_NAME` (default: `commentable_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use commentable_common::AppError;
use commentable_db::{
    entities::{
        EntityStatus,
        comment::{self, CommentableType},
        reaction::{self, ReactionType},
        report::{self, ReportCategory, ReportStatus},
        user::{self, UserRole},
        video,
    },
    repositories::{
        CommentRepository, ReactionRepository, ReportRepository, UserRepository, VideoRepository,
    },
    test_utils::{TestDatabase, TestDbConfig},
};
use sea_orm::Set;

async fn insert_user(repo: &UserRepository, id: &str) -> user::Model {
    repo.create(user::ActiveModel {
        id: Set(id.to_string()),
        username: Set(format!("user_{id}")),
        username_lower: Set(format!("user_{id}")),
        email: Set(format!("{id}@example.com")),
        password_hash: Set("hash".to_string()),
        token: Set(Some(format!("token-{id}"))),
        display_name: Set(None),
        avatar_url: Set(None),
        bio: Set(None),
        role: Set(UserRole::User),
        status: Set(EntityStatus::Active),
        ..Default::default()
    })
    .await
    .unwrap()
}

async fn insert_video(repo: &VideoRepository, id: &str, user_id: &str) -> video::Model {
    repo.create(video::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(user_id.to_string()),
        title: Set("A video".to_string()),
        description: Set(None),
        video_url: Set("https://example.com/v.mp4".to_string()),
        thumbnail_url: Set(None),
        duration: Set(60),
        view_count: Set(0),
        comment_count: Set(0),
        status: Set(EntityStatus::Active),
        ..Default::default()
    })
    .await
    .unwrap()
}

fn comment_model(
    id: &str,
    user_id: &str,
    video_id: &str,
    parent: Option<&comment::Model>,
) -> comment::ActiveModel {
    comment::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(user_id.to_string()),
        content: Set(format!("comment {id}")),
        commentable_type: Set(CommentableType::Video),
        commentable_id: Set(video_id.to_string()),
        parent_comment_id: Set(parent.map(|p| p.id.clone())),
        depth: Set(parent.map_or(0, |p| p.depth + 1)),
        reply_count: Set(0),
        reaction_count: Set(0),
        status: Set(EntityStatus::Active),
        ..Default::default()
    }
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(config.database_url().starts_with("postgres://"));
    assert!(config.postgres_url().ends_with("/postgres"));
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_ping() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    commentable_db::ping(db.connection()).await.unwrap();
    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_comment_counters_follow_visibility() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    let users = UserRepository::new(db.shared());
    let videos = VideoRepository::new(db.shared());
    let comments = CommentRepository::new(db.shared());

    insert_user(&users, "u1").await;
    insert_video(&videos, "v1", "u1").await;

    let root = comments
        .create(comment_model("c1", "u1", "v1", None))
        .await
        .unwrap();
    let reply = comments
        .create(comment_model("c2", "u1", "v1", Some(&root)))
        .await
        .unwrap();

    assert_eq!(comments.get_by_id("c1").await.unwrap().reply_count, 1);
    assert_eq!(videos.get_by_id("v1").await.unwrap().comment_count, 2);

    let removed = comments
        .transition_status(reply.clone(), EntityStatus::Removed)
        .await
        .unwrap();
    assert_eq!(removed.map(|c| c.status), Some(EntityStatus::Removed));
    assert_eq!(comments.get_by_id("c1").await.unwrap().reply_count, 0);
    assert_eq!(videos.get_by_id("v1").await.unwrap().comment_count, 1);

    // The stale snapshot still says Active, so the second transition loses.
    let stale = comments
        .transition_status(reply, EntityStatus::Removed)
        .await
        .unwrap();
    assert!(stale.is_none());
    assert_eq!(videos.get_by_id("v1").await.unwrap().comment_count, 1);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_second_reaction_by_same_user_conflicts() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    let users = UserRepository::new(db.shared());
    let videos = VideoRepository::new(db.shared());
    let comments = CommentRepository::new(db.shared());
    let reactions = ReactionRepository::new(db.shared());

    insert_user(&users, "u1").await;
    insert_video(&videos, "v1", "u1").await;
    comments
        .create(comment_model("c1", "u1", "v1", None))
        .await
        .unwrap();

    let reaction_model = |id: &str, reaction_type| reaction::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set("u1".to_string()),
        comment_id: Set("c1".to_string()),
        reaction_type: Set(reaction_type),
        ..Default::default()
    };

    let first = reactions
        .create(reaction_model("r1", ReactionType::Like))
        .await
        .unwrap();
    let second = reactions
        .create(reaction_model("r2", ReactionType::Love))
        .await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
    assert_eq!(comments.get_by_id("c1").await.unwrap().reaction_count, 1);

    assert!(reactions.delete(&first).await.unwrap());
    assert_eq!(comments.get_by_id("c1").await.unwrap().reaction_count, 0);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_reports_flag_comment_at_threshold() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    let users = UserRepository::new(db.shared());
    let videos = VideoRepository::new(db.shared());
    let comments = CommentRepository::new(db.shared());
    let reports = ReportRepository::new(db.shared());

    for id in ["u1", "u2", "u3"] {
        insert_user(&users, id).await;
    }
    insert_video(&videos, "v1", "u1").await;
    comments
        .create(comment_model("c1", "u1", "v1", None))
        .await
        .unwrap();

    let report_model = |id: &str, user_id: &str| report::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(user_id.to_string()),
        comment_id: Set("c1".to_string()),
        category: Set(ReportCategory::Spam),
        description: Set(None),
        status: Set(ReportStatus::Pending),
        ..Default::default()
    };

    let (_, flagged) = reports.create(report_model("rp1", "u2"), 2).await.unwrap();
    assert!(flagged.is_none());

    let duplicate = reports.create(report_model("rp2", "u2"), 2).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let (_, flagged) = reports.create(report_model("rp3", "u3"), 2).await.unwrap();
    assert_eq!(flagged.map(|c| c.status), Some(EntityStatus::Flagged));

    // Flagged comments stay visible and keep counting.
    assert_eq!(videos.get_by_id("v1").await.unwrap().comment_count, 1);

    db.drop_database().await.unwrap();
}
