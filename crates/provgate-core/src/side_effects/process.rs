//! Local process handle
//!
//! Explicit replacement for "the server this process runs as": its own
//! server entry, the services it hosts, and whether startup finished.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::model::entry::{Entry, EntryKind};

pub struct LocalProcess {
    server: RwLock<Arc<dyn Entry>>,
    services: BTreeSet<String>,
    started: AtomicBool,
}

impl std::fmt::Debug for LocalProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProcess")
            .field("server_id", &self.server().id().to_string())
            .field("services", &self.services)
            .field("started", &self.is_started())
            .finish()
    }
}

impl LocalProcess {
    pub fn new<I, S>(server: Arc<dyn Entry>, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            server: RwLock::new(server),
            services: services
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
            started: AtomicBool::new(false),
        }
    }

    /// Called once process startup has finished
    pub fn mark_started(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn hosts(&self, service: &str) -> bool {
        self.services.contains(&service.to_ascii_lowercase())
    }

    /// Current snapshot of this process's server entry
    pub fn server(&self) -> Arc<dyn Entry> {
        match self.server.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Swap in a fresh server entry (e.g. after a reload)
    pub fn refresh(&self, server: Arc<dyn Entry>) {
        match self.server.write() {
            Ok(mut guard) => *guard = server,
            Err(poisoned) => *poisoned.into_inner() = server,
        }
    }

    /// True when `entry` is this process's own server entry
    pub fn is_local_server(&self, entry: &dyn Entry) -> bool {
        entry.kind() == EntryKind::Server && entry.id() == self.server().id()
    }
}
