//! Change notification to extension hooks
//!
//! The previous value of a watched attribute is captured in phase 1 and
//! compared with the committed value in phase 2. A change is delivered to
//! every registered hook; hook failures are logged and dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::context::{DataKey, TransactionContext};
use crate::errors::{ExError, Result};
use crate::model::batch::DeltaBatch;
use crate::model::entry::{Entry, EntryKind};
use crate::mutation::AttrMutation;
use crate::registry::{Validator, ValidatorId};

pub const ACCOUNT_STATUS_ID: &str = "account_status_notifier";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKey {
    #[serde(rename = "account.status.changed")]
    AccountStatusChanged,
}

impl EventKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKey::AccountStatusChanged => "account.status.changed",
        }
    }
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed attribute change, as seen by extension hooks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub key: EventKey,
    pub entry_id: String,
    pub entry_kind: EntryKind,
    pub attr: String,
    pub old: Option<String>,
    pub new: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Fire-and-forget receiver of change events
pub trait ExtensionHook: Send + Sync {
    /// # Errors
    ///
    /// Reported errors are logged by the caller and otherwise ignored.
    fn notify(&self, event: &ChangeEvent) -> Result<()>;
}

/// Hook that writes each event to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHook;

impl ExtensionHook for LoggingHook {
    fn notify(&self, event: &ChangeEvent) -> Result<()> {
        info!(
            event_key = event.key.as_str(),
            entry_id = event.entry_id.as_str(),
            attr = event.attr.as_str(),
            old = ?event.old,
            new = ?event.new,
            "extension event"
        );
        Ok(())
    }
}

/// Captures the old status before commit and reports a change after it
pub struct StatusChangeNotifier {
    id: ValidatorId,
    key: EventKey,
    stash: DataKey,
    hooks: Vec<Arc<dyn ExtensionHook>>,
}

impl StatusChangeNotifier {
    pub fn account_status(hooks: Vec<Arc<dyn ExtensionHook>>) -> Self {
        Self {
            id: ValidatorId::new(ACCOUNT_STATUS_ID),
            key: EventKey::AccountStatusChanged,
            stash: DataKey::PreviousAccountStatus,
            hooks,
        }
    }
}

impl Validator for StatusChangeNotifier {
    fn id(&self) -> ValidatorId {
        self.id.clone()
    }

    fn pre_modify(
        &self,
        ctx: &mut TransactionContext,
        attr: &str,
        batch: &DeltaBatch,
        entry: Option<&dyn Entry>,
    ) -> Result<Option<DeltaBatch>> {
        if AttrMutation::from_batch(attr, batch)?.is_touched() {
            let previous = entry.and_then(|e| e.get_single(attr)).unwrap_or_default();
            ctx.set_data(self.stash, previous);
        }
        Ok(None)
    }

    fn post_modify(&self, ctx: &mut TransactionContext, attr: &str, entry: &dyn Entry) -> Result<()> {
        let old = ctx.take_data(self.stash).filter(|v| !v.is_empty());
        let new = entry.get_single(attr).filter(|v| !v.is_empty());
        if old == new {
            return Ok(());
        }

        let event = ChangeEvent {
            key: self.key,
            entry_id: entry.id().to_string(),
            entry_kind: entry.kind(),
            attr: attr.to_string(),
            old,
            new,
            occurred_at: Utc::now(),
        };
        for hook in &self.hooks {
            if let Err(err) = hook.notify(&event) {
                let ex = ExError::from(err);
                warn!(
                    event_key = self.key.as_str(),
                    entry_id = event.entry_id.as_str(),
                    err.code = ex.code(),
                    error = %ex,
                    "extension hook failed"
                );
            }
        }
        Ok(())
    }
}
