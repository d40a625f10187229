//! Business logic services.

pub mod comment;
pub mod commentable;
pub mod moderation;
pub mod post;
pub mod reaction;
pub mod stats;
pub mod user;
pub mod video;

#[cfg(test)]
pub(crate) mod test_support;

pub use comment::{
    CommentNode, CommentQuery, CommentService, CommentView, CreateCommentInput,
    UpdateCommentInput,
};
pub use commentable::{Commentable, CommentableResolver};
pub use moderation::{
    CreateReportInput, ModerationService, ReportOutcome, ReportQuery, ReportView,
    ReviewReportInput,
};
pub use post::{CreatePostInput, PostQuery, PostService, UpdatePostInput};
pub use reaction::{
    ReactionQuery, ReactionService, ReactionSummary, UpsertPlan, UpsertReactionInput, plan_upsert,
};
pub use stats::{ModerationStats, Stats, StatsService, UserStats};
pub use user::{RegisterInput, Registration, UserService};
pub use video::{CreateVideoInput, UpdateVideoInput, VideoQuery, VideoService};
