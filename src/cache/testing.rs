//! Test doubles for the cache layer

use crate::cache::Cacher;
use crate::error::{Result, TeamsResolverError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory store that records every call
#[derive(Default)]
pub(crate) struct RecordingCache {
    pub entries: Mutex<HashMap<String, Vec<String>>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_reads: bool,
}

impl RecordingCache {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn preload(&self, key: &str, ids: &[&str]) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), ids.iter().map(|s| s.to_string()).collect());
    }
}

#[async_trait]
impl Cacher for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<String>>> {
        self.calls.lock().unwrap().push(format!("get {key}"));
        if self.fail_reads {
            return Err(TeamsResolverError::CacheDecode("bad shape".to_string()));
        }
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, id: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("set {key} {id}"));
        let mut entries = self.entries.lock().unwrap();
        let ids = entries.entry(key.to_string()).or_default();
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("invalidate {key}"));
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.calls.lock().unwrap().push("clear".to_string());
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}
