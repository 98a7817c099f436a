//! Persistent key to ID-set store

use crate::error::{Result, TeamsResolverError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// Storage behind the cache handler
///
/// A key maps to an ordered, deduplicated list of IDs. Only a list holding
/// exactly one ID is a trustworthy mapping; callers decide what to do with
/// anything else.
#[async_trait]
pub trait Cacher: Send + Sync {
    /// IDs stored under `key`. A value that is not a list of strings is a
    /// `CacheDecode` error for that key only.
    async fn get(&self, key: &str) -> Result<Option<Vec<String>>>;

    /// Append `id` to the IDs under `key` unless already present
    async fn set(&self, key: &str, id: &str) -> Result<()>;

    async fn invalidate(&self, key: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// Decode a stored value into its ID list
pub fn decode_ids(key: &str, value: &Value) -> Result<Vec<String>> {
    serde_json::from_value(value.clone()).map_err(|e| {
        TeamsResolverError::CacheDecode(format!(
            "value under '{}' is not a list of IDs: {}",
            key, e
        ))
    })
}

/// JSON file cache, rewritten wholesale on every mutation
///
/// The file is loaded on first access. A single lock guards both the
/// in-memory view and the file, and a mutation only becomes visible once the
/// new file has been renamed into place.
pub struct JsonFileCache {
    path: PathBuf,
    entries: Mutex<Option<Map<String, Value>>>,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored key and its raw value
    pub async fn snapshot(&self) -> Result<Map<String, Value>> {
        let mut guard = self.entries.lock().await;
        Ok(self.loaded(&mut guard).await?.clone())
    }

    async fn loaded<'a>(
        &self,
        slot: &'a mut Option<Map<String, Value>>,
    ) -> Result<&'a mut Map<String, Value>> {
        if slot.is_none() {
            let entries = load(&self.path).await?;
            tracing::debug!(
                path = %self.path.display(),
                entries = entries.len(),
                "Loaded cache file"
            );
            *slot = Some(entries);
        }
        slot.as_mut()
            .ok_or_else(|| TeamsResolverError::Internal("cache not loaded".to_string()))
    }

    /// Apply `change` to a copy of the entries, persist it, then commit
    async fn mutate<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let mut guard = self.entries.lock().await;
        let current = self.loaded(&mut guard).await?;

        let mut next = current.clone();
        change(&mut next);
        persist(&self.path, &next).await?;

        *current = next;
        Ok(())
    }
}

#[async_trait]
impl Cacher for JsonFileCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<String>>> {
        let mut guard = self.entries.lock().await;
        let entries = self.loaded(&mut guard).await?;
        entries.get(key).map(|v| decode_ids(key, v)).transpose()
    }

    async fn set(&self, key: &str, id: &str) -> Result<()> {
        self.mutate(|entries| {
            // Anything that is not a list of strings is overwritten
            let mut ids = match entries.get(key) {
                Some(Value::Array(items)) if items.iter().all(Value::is_string) => items.clone(),
                _ => Vec::new(),
            };
            if !ids.iter().any(|v| v.as_str() == Some(id)) {
                ids.push(Value::String(id.to_string()));
            }
            entries.insert(key.to_string(), Value::Array(ids));
        })
        .await
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.mutate(|entries| entries.clear()).await
    }
}

async fn load(path: &Path) -> Result<Map<String, Value>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => {
            return Err(TeamsResolverError::CacheIo(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )));
        }
    };

    if content.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(entries)) => Ok(entries),
        Ok(_) => Err(TeamsResolverError::CacheDecode(format!(
            "{} does not contain a JSON object",
            path.display()
        ))),
        Err(e) => Err(TeamsResolverError::CacheDecode(format!(
            "failed to parse {}: {}",
            path.display(),
            e
        ))),
    }
}

async fn persist(path: &Path, entries: &Map<String, Value>) -> Result<()> {
    let io_err = |action: &str, e: std::io::Error| {
        TeamsResolverError::CacheIo(format!("failed to {} {}: {}", action, path.display(), e))
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| io_err("create directory for", e))?;
    }

    let content = serde_json::to_string_pretty(entries)?;
    let tmp = tmp_path(path);

    fs::write(&tmp, content)
        .await
        .map_err(|e| io_err("write", e))?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(io_err("replace", e));
    }

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cache".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
}
