//! Live-reloadable maintenance tasks
//!
//! A task governed by a server-scoped attribute is started or stopped when
//! that attribute changes, without a restart. After commit the handler
//! reads the governing value and compares it with the task's state:
//!
//! | enabled | running | action   |
//! |---------|---------|----------|
//! | yes     | no      | start    |
//! | no      | yes     | stop     |
//! | same    | same    | nothing  |
//!
//! Nothing happens unless the changed attribute is the governing one,
//! process startup has finished, the process hosts the gated service, and
//! (for a server entry) the entry is this process's own server. A global
//! config change is read through the local server: the server's own value
//! wins, otherwise the committed global value applies.

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::attrs;
use crate::context::TransactionContext;
use crate::errors::{ProvError, Result};
use crate::interval::entry_interval;
use crate::model::entry::{Entry, EntryKind};
use crate::registry::{Validator, ValidatorId};
use crate::side_effects::process::LocalProcess;
use crate::side_effects::task::MaintenanceTask;

pub const MAIL_PURGE_ID: &str = "mail_purge_task";
pub const FREEBUSY_PROPAGATION_ID: &str = "freebusy_propagation_task";

/// How the governing attribute turns the task on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Duration attribute; enabled when positive
    Interval { default: String },
    /// Boolean attribute; enabled when `TRUE`
    Flag,
}

impl Gate {
    fn enabled(&self, entry: &dyn Entry, attr: &str) -> bool {
        match self {
            Gate::Interval { default } => !entry_interval(entry, attr, default).is_zero(),
            Gate::Flag => entry
                .get_single(attr)
                .is_some_and(|v| v.eq_ignore_ascii_case("TRUE")),
        }
    }
}

/// The local server as seen after a global config commit
///
/// Values the server sets itself win; everything else comes from the
/// freshly committed global config rather than the server's cached defaults.
struct Inherited<'a> {
    own: &'a dyn Entry,
    parent: &'a dyn Entry,
}

impl Entry for Inherited<'_> {
    fn kind(&self) -> EntryKind {
        self.own.kind()
    }

    fn id(&self) -> &str {
        self.own.id()
    }

    fn name(&self) -> &str {
        self.own.name()
    }

    fn get_single(&self, attr: &str) -> Option<String> {
        self.get_multi(attr).into_iter().next()
    }

    fn get_multi(&self, attr: &str) -> Vec<String> {
        let own = self.own.get_own_multi(attr);
        if own.is_empty() {
            self.parent.get_multi(attr)
        } else {
            own
        }
    }

    fn get_own_multi(&self, attr: &str) -> Vec<String> {
        self.own.get_own_multi(attr)
    }
}

pub struct LiveReloadTask {
    id: ValidatorId,
    attr: String,
    service: Option<String>,
    gate: Gate,
    process: Arc<LocalProcess>,
    task: Arc<dyn MaintenanceTask>,
    transition: Mutex<()>,
}

impl LiveReloadTask {
    pub fn new(
        id: &str,
        attr: &str,
        service: Option<&str>,
        gate: Gate,
        process: Arc<LocalProcess>,
        task: Arc<dyn MaintenanceTask>,
    ) -> Self {
        Self {
            id: ValidatorId::new(id),
            attr: attr.to_string(),
            service: service.map(str::to_string),
            gate,
            process,
            task,
            transition: Mutex::new(()),
        }
    }

    /// Mailbox purge, governed by `mailPurgeSleepInterval`
    pub fn mail_purge(process: Arc<LocalProcess>, task: Arc<dyn MaintenanceTask>) -> Self {
        Self::new(
            MAIL_PURGE_ID,
            attrs::MAIL_PURGE_SLEEP_INTERVAL,
            Some("mailbox"),
            Gate::Interval {
                default: "1m".to_string(),
            },
            process,
            task,
        )
    }

    /// Free/busy propagation, governed by `freebusyPropagationEnabled`
    pub fn freebusy_propagation(process: Arc<LocalProcess>, task: Arc<dyn MaintenanceTask>) -> Self {
        Self::new(
            FREEBUSY_PROPAGATION_ID,
            attrs::FREEBUSY_PROPAGATION_ENABLED,
            None,
            Gate::Flag,
            process,
            task,
        )
    }

    fn applies_to(&self, attr: &str, entry: &dyn Entry) -> bool {
        if !attr.eq_ignore_ascii_case(&self.attr) {
            return false;
        }
        if !self.process.is_started() {
            debug!(attr, "process still starting, task left alone");
            return false;
        }
        if let Some(service) = &self.service {
            if !self.process.hosts(service) {
                return false;
            }
        }
        entry.kind() != EntryKind::Server || self.process.is_local_server(entry)
    }
}

impl Validator for LiveReloadTask {
    fn id(&self) -> ValidatorId {
        self.id.clone()
    }

    fn post_modify(&self, _ctx: &mut TransactionContext, attr: &str, entry: &dyn Entry) -> Result<()> {
        if !self.applies_to(attr, entry) {
            return Ok(());
        }

        let server = self.process.server();
        let enabled = match entry.kind() {
            EntryKind::Server => self.gate.enabled(entry, &self.attr),
            EntryKind::GlobalConfig => {
                let inherited = Inherited {
                    own: server.as_ref(),
                    parent: entry,
                };
                self.gate.enabled(&inherited, &self.attr)
            }
            _ => self.gate.enabled(server.as_ref(), &self.attr),
        };

        let _guard = match self.transition.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let running = self.task.is_running();
        let side_effect = |e: ProvError| ProvError::SideEffect {
            attr: attr.to_string(),
            message: format!("{}: {}", self.task.name(), e),
        };

        match (enabled, running) {
            (true, false) => {
                self.task.startup().map_err(side_effect)?;
                info!(attr, task = self.task.name(), "task started after attribute change");
            }
            (false, true) => {
                self.task.shutdown().map_err(side_effect)?;
                info!(attr, task = self.task.name(), "task stopped after attribute change");
            }
            _ => debug!(attr, task = self.task.name(), enabled, "task already in desired state"),
        }
        Ok(())
    }
}
