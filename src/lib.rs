pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod resolver;
pub mod teams;

pub use error::{RequestError, Result, TeamsResolverError};
