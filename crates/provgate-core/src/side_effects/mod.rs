//! Post-commit reactions: task lifecycle, cache invalidation, notification
//!
//! These run from `post_modify` only. Their failures are logged by the
//! orchestrator and never reach the caller.

pub mod cache;
pub mod live_reload;
pub mod notify;
pub mod process;
pub mod task;

pub use cache::{CacheKey, EntryCache, ResolutionCache};
pub use live_reload::{Gate, LiveReloadTask};
pub use notify::{ChangeEvent, EventKey, ExtensionHook, LoggingHook, StatusChangeNotifier};
pub use process::LocalProcess;
pub use task::{MaintenanceTask, ToggleTask};
