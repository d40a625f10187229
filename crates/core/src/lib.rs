//! Core business logic for commentable.
//!
//! Every operation takes the calling [`Actor`] explicitly and checks it
//! against the role capability table in [`authorization`].

pub mod authorization;
pub mod services;
pub mod status;

pub use authorization::{Actor, Capability, UserRole, capabilities};
pub use services::*;
