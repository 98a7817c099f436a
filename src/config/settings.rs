use crate::error::{Result, TeamsResolverError};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub cache: CacheConfig,
    pub resolver: ResolverConfig,
}

/// How cache maintenance runs relative to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    Disabled,
    Sync,
    Async,
}

impl FromStr for CacheMode {
    type Err = TeamsResolverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "none" => Ok(Self::Disabled),
            "sync" => Ok(Self::Sync),
            "async" => Ok(Self::Async),
            other => Err(TeamsResolverError::Config(format!(
                "Invalid TEAMS_CACHE_MODE '{}' (expected disabled, sync or async)",
                other
            ))),
        }
    }
}

/// Backing storage for the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheProvider {
    JsonFile,
}

impl FromStr for CacheProvider {
    type Err = TeamsResolverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "json-file" => Ok(Self::JsonFile),
            other => Err(TeamsResolverError::Config(format!(
                "Unsupported TEAMS_CACHE_PROVIDER '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub mode: CacheMode,
    pub provider: CacheProvider,
    pub path: PathBuf,
}

impl CacheConfig {
    /// ~/.cache/teams-resolver/cache.json on Linux, platform equivalent elsewhere
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("teams-resolver")
            .join("cache.json")
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mode: CacheMode::Sync,
            provider: CacheProvider::JsonFile,
            path: Self::default_path(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// None disables the deadline
    pub fetch_timeout: Option<Duration>,
    /// Explicit pepper, bypasses the keyring
    pub pepper: Option<String>,
}

pub fn load_settings() -> Result<Settings> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cache = CacheConfig {
        mode: std::env::var("TEAMS_CACHE_MODE")
            .unwrap_or_else(|_| "sync".to_string())
            .parse()?,
        provider: std::env::var("TEAMS_CACHE_PROVIDER")
            .unwrap_or_else(|_| "json".to_string())
            .parse()?,
        path: std::env::var("TEAMS_CACHE_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(CacheConfig::default_path),
    };

    let fetch_timeout_secs: u64 = std::env::var("TEAMS_FETCH_TIMEOUT_SECS")
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .map_err(|_| TeamsResolverError::Config("Invalid TEAMS_FETCH_TIMEOUT_SECS".to_string()))?;

    let resolver = ResolverConfig {
        fetch_timeout: (fetch_timeout_secs > 0).then(|| Duration::from_secs(fetch_timeout_secs)),
        pepper: std::env::var("TEAMS_RESOLVER_PEPPER")
            .ok()
            .filter(|p| !p.is_empty()),
    };

    Ok(Settings { cache, resolver })
}
