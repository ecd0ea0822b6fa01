//! Cached reference resolutions and their invalidation

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

/// Which cached resolution on an entry to drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The account's effective class of service
    AccountCos,
    /// The domain's default class of service
    DomainDefaultCos,
}

/// Handle to the process-local entry cache
pub trait EntryCache: Send + Sync {
    fn invalidate(&self, entry_id: &str, key: CacheKey);
}

/// In-memory resolution cache keyed by entry id and cache key
#[derive(Debug, Default)]
pub struct ResolutionCache {
    resolved: RwLock<HashMap<(String, CacheKey), String>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, entry_id: &str, key: CacheKey, resolved_id: impl Into<String>) {
        if let Ok(mut map) = self.resolved.write() {
            map.insert((entry_id.to_string(), key), resolved_id.into());
        }
    }

    pub fn get(&self, entry_id: &str, key: CacheKey) -> Option<String> {
        self.resolved
            .read()
            .ok()
            .and_then(|map| map.get(&(entry_id.to_string(), key)).cloned())
    }
}

impl EntryCache for ResolutionCache {
    fn invalidate(&self, entry_id: &str, key: CacheKey) {
        if let Ok(mut map) = self.resolved.write() {
            if map.remove(&(entry_id.to_string(), key)).is_some() {
                debug!(entry_id, ?key, "invalidated cached resolution");
            }
        }
    }
}
