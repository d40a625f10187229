//! Model builders shared by service tests.

use chrono::Utc;
use commentable_db::entities::{
    EntityStatus,
    comment::{self, CommentableType},
    post,
    reaction::{self, ReactionType},
    report::{self, ReportCategory, ReportStatus},
    user::{self, UserRole},
    video,
};
use sea_orm::{MockExecResult, Value};
use std::collections::BTreeMap;

use crate::authorization::Actor;

pub fn create_test_user(id: &str, role: UserRole) -> user::Model {
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

pub fn actor(id: &str, role: UserRole) -> Actor {
    Actor::from_user(&create_test_user(id, role))
}

pub fn create_test_video(id: &str, user_id: &str) -> video::Model {
    video::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        title: "Test video".to_string(),
        description: Some("A video".to_string()),
        video_url: "https://cdn.example.com/v.mp4".to_string(),
        thumbnail_url: None,
        duration: 90,
        view_count: 0,
        comment_count: 0,
        status: EntityStatus::Active,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

pub fn create_test_post(id: &str, user_id: &str) -> post::Model {
    post::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        title: "Test post".to_string(),
        content: "Body".to_string(),
        slug: format!("test-post-{id}"),
        featured_image_url: None,
        published_at: Some(Utc::now().into()),
        view_count: 0,
        comment_count: 0,
        status: EntityStatus::Active,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

pub fn create_test_comment(id: &str, user_id: &str, parent: Option<&str>) -> comment::Model {
    comment::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        content: "Nice post".to_string(),
        commentable_type: CommentableType::Post,
        commentable_id: "p1".to_string(),
        parent_comment_id: parent.map(str::to_string),
        depth: i32::from(parent.is_some()),
        reply_count: 0,
        reaction_count: 0,
        status: EntityStatus::Active,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

pub fn create_test_reaction(
    id: &str,
    user_id: &str,
    comment_id: &str,
    reaction_type: ReactionType,
) -> reaction::Model {
    reaction::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        comment_id: comment_id.to_string(),
        reaction_type,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

pub fn create_test_report(id: &str, user_id: &str, comment_id: &str) -> report::Model {
    report::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        comment_id: comment_id.to_string(),
        category: ReportCategory::Harassment,
        description: None,
        status: ReportStatus::Pending,
        reviewed_by: None,
        reviewed_at: None,
        review_notes: None,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

pub const fn exec_ok(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

/// A row as returned by `COUNT(*)` queries.
pub fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    maplit::btreemap! { "num_items" => Value::BigInt(Some(n)) }
}
