//! Boundary types shared with the Teams API client
//!
//! The resolver only depends on these models and the `TeamsApi` trait; the
//! Graph client that implements it lives outside this crate.

mod api;
mod types;

pub use api::TeamsApi;
pub use types::{Channel, Chat, ChatType, Member, Team, User};
