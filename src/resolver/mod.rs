//! Cache-aside resolution of references to Teams IDs

mod engine;
mod extract;
pub mod patterns;
mod teams;

pub use engine::{Resolver, ResolverContext};
pub use extract::{Candidate, match_single};
pub use teams::TeamsResolver;
