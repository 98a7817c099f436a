use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Status codes that indicate a cached name-to-ID mapping has gone stale
pub const INVALIDATING_STATUS_CODES: [u16; 6] = [400, 404, 409, 412, 413, 422];

/// Failure reported by the remote Teams API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub code: u16,
    pub message: String,
}

impl RequestError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request failed with status {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RequestError {}

#[derive(Debug, Error)]
pub enum TeamsResolverError {
    #[error("Reference cannot be empty")]
    EmptyReference,

    #[error("No {kind} available to match against")]
    ResourcesUnavailable { kind: &'static str },

    #[error("{kind} '{reference}' not found")]
    ResourceNotFound {
        kind: &'static str,
        reference: String,
    },

    #[error(
        "Multiple {kind} resources match '{reference}': {}. Retry with an explicit ID",
        .candidates.join(", ")
    )]
    ResourceAmbiguous {
        kind: &'static str,
        reference: String,
        candidates: Vec<String>,
    },

    #[error("{kind} '{reference}' matched a resource with an empty ID")]
    ResourceEmptyId {
        kind: &'static str,
        reference: String,
    },

    #[error("Remote API error: {0}")]
    Remote(#[from] RequestError),

    #[error("Fetching {kind} timed out after {}s", .timeout.as_secs())]
    FetchTimeout {
        kind: &'static str,
        timeout: Duration,
    },

    #[error("Cache decode error: {0}")]
    CacheDecode(String),

    #[error("Cache IO error: {0}")]
    CacheIo(String),

    #[error("Pepper unavailable: {0}")]
    PepperUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TeamsResolverError {
    /// Status code of the underlying remote failure, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Remote(e) => Some(e.code),
            _ => None,
        }
    }

    /// Whether this error is evidence that cached identity mappings are stale
    pub fn invalidates_cache(&self) -> bool {
        self.status_code()
            .is_some_and(|code| INVALIDATING_STATUS_CODES.contains(&code))
    }
}

pub type Result<T> = std::result::Result<T, TeamsResolverError>;
