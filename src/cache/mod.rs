//! Local cache for resolved Teams IDs
//!
//! Key features:
//! - Namespaced keys with peppered hashes for anything identifying a person
//! - JSON file store, rewritten wholesale under a single lock
//! - Inline or background maintenance through a task runner
//! - Whole-cache invalidation on remote errors that indicate stale mappings

mod handler;
mod key;
mod pepper;
mod runner;
mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use handler::{CacheHandler, CacheStats};
pub use key::{CacheKey, CacheKeyBuilder, CacheNamespace, KeyPart, hash_identity};
pub use pepper::{DEFAULT_PEPPER, KeyringPepper, Pepper, PepperProvider, StaticPepper};
pub use runner::TaskRunner;
pub use store::{Cacher, JsonFileCache, decode_ids};
