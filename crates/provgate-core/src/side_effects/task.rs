//! Maintenance task lifecycle seam

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::info;

use crate::errors::Result;

/// A background task that can be started and stopped at runtime
///
/// `startup` on a running task and `shutdown` on a stopped one must be
/// no-ops.
pub trait MaintenanceTask: Send + Sync {
    fn name(&self) -> &str;

    fn is_running(&self) -> bool;

    /// # Errors
    ///
    /// Implementation-specific start failure.
    fn startup(&self) -> Result<()>;

    /// # Errors
    ///
    /// Implementation-specific stop failure.
    fn shutdown(&self) -> Result<()>;
}

/// Task that only tracks its running flag
///
/// Stands in for a task runtime that lives elsewhere in the process;
/// counts real transitions.
#[derive(Debug, Default)]
pub struct ToggleTask {
    name: String,
    running: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl ToggleTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn running(name: impl Into<String>) -> Self {
        let task = Self::new(name);
        task.running.store(true, Ordering::SeqCst);
        task
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl MaintenanceTask for ToggleTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn startup(&self) -> Result<()> {
        if !self.running.swap(true, Ordering::SeqCst) {
            self.starts.fetch_add(1, Ordering::SeqCst);
            info!(task = self.name.as_str(), "task started");
        }
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        if self.running.swap(false, Ordering::SeqCst) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            info!(task = self.name.as_str(), "task stopped");
        }
        Ok(())
    }
}
