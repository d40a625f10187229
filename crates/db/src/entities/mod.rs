//! Database entities.

pub mod comment;
pub mod entity_status;
pub mod post;
pub mod reaction;
pub mod report;
pub mod user;
pub mod video;

pub use comment::Entity as Comment;
pub use entity_status::EntityStatus;
pub use post::Entity as Post;
pub use reaction::Entity as Reaction;
pub use report::Entity as Report;
pub use user::Entity as User;
pub use video::Entity as Video;
