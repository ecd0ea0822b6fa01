#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use provgate_core::attrs;
use provgate_core::library::{standard_orchestrator, Collaborators};
use provgate_core::side_effects::{
    ChangeEvent, ExtensionHook, LocalProcess, ResolutionCache, ToggleTask,
};
use provgate_core::{
    AttributeCatalogue, DeltaBatch, Entry, EntryKind, GateConfig, MemDirectory, MemEntry,
    Orchestrator, Result, TransactionContext, Validator, ValidatorId,
};

pub const LOCAL_SERVER_ID: &str = "srv-1";

/// The built-in catalogue
pub fn catalogue() -> Arc<AttributeCatalogue> {
    Arc::new(AttributeCatalogue::builtin().unwrap())
}

/// Account `a@x.com` with alias `b@x.com`
pub fn account() -> MemEntry {
    MemEntry::new(EntryKind::Account, "acct-1", "a@x.com").with_attr(attrs::MAIL_ALIAS, ["b@x.com"])
}

/// Domain `x.com` with the given aggregate quota
pub fn domain(aggregate_quota: &str) -> MemEntry {
    MemEntry::new(EntryKind::Domain, "dom-1", "x.com")
        .with_attr(attrs::DOMAIN_AGGREGATE_QUOTA, aggregate_quota)
}

/// Directory holding domain `x.com` (quota 1000) and class of service `cos-1`
pub fn directory() -> MemDirectory {
    MemDirectory::new()
        .with_domain(domain("1000"))
        .with_cos(MemEntry::new(EntryKind::Cos, "cos-1", "default"))
}

pub fn local_server(interval: &str) -> MemEntry {
    MemEntry::new(EntryKind::Server, LOCAL_SERVER_ID, "mbox1")
        .with_attr(attrs::MAIL_PURGE_SLEEP_INTERVAL, interval)
}

/// Hook that records every event it receives
#[derive(Default)]
pub struct RecordingHook {
    pub events: Mutex<Vec<ChangeEvent>>,
}

impl ExtensionHook for RecordingHook {
    fn notify(&self, event: &ChangeEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Standard orchestrator plus typed handles on its collaborators
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub process: Arc<LocalProcess>,
    pub purge_task: Arc<ToggleTask>,
    pub freebusy_task: Arc<ToggleTask>,
    pub cache: Arc<ResolutionCache>,
    pub hook: Arc<RecordingHook>,
}

/// Standard wiring with the local server running with purge interval `interval`
pub fn harness(interval: &str) -> Harness {
    let config = GateConfig::default();
    let process = Arc::new(LocalProcess::new(Arc::new(local_server(interval)), ["mailbox"]));
    process.mark_started();
    let purge_task = Arc::new(ToggleTask::new("mail-purge"));
    let freebusy_task = Arc::new(ToggleTask::new("freebusy"));
    let cache = Arc::new(ResolutionCache::new());
    let hook = Arc::new(RecordingHook::default());

    let collab = Collaborators {
        directory: Arc::new(directory()),
        cache: cache.clone(),
        process: process.clone(),
        purge_task: purge_task.clone(),
        freebusy_task: freebusy_task.clone(),
        hooks: vec![hook.clone() as Arc<dyn ExtensionHook>],
    };
    let orchestrator = standard_orchestrator(&config, catalogue(), &collab).unwrap();

    Harness {
        orchestrator,
        process,
        purge_task,
        freebusy_task,
        cache,
        hook,
    }
}

/// Validator that counts calls and can be told to fail or panic
pub struct CountingValidator {
    pub id: &'static str,
    pub guarded: bool,
    pub pre_calls: AtomicUsize,
    pub guarded_runs: AtomicUsize,
    pub post_calls: AtomicUsize,
    pub fail_post: bool,
    pub panic_post: bool,
}

impl CountingValidator {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            guarded: false,
            pre_calls: AtomicUsize::new(0),
            guarded_runs: AtomicUsize::new(0),
            post_calls: AtomicUsize::new(0),
            fail_post: false,
            panic_post: false,
        }
    }

    pub fn pre_calls(&self) -> usize {
        self.pre_calls.load(Ordering::SeqCst)
    }

    pub fn guarded_runs(&self) -> usize {
        self.guarded_runs.load(Ordering::SeqCst)
    }

    pub fn post_calls(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }
}

impl Validator for CountingValidator {
    fn id(&self) -> ValidatorId {
        ValidatorId::new(self.id)
    }

    fn pre_modify(
        &self,
        ctx: &mut TransactionContext,
        _attr: &str,
        _batch: &DeltaBatch,
        _entry: Option<&dyn Entry>,
    ) -> Result<Option<DeltaBatch>> {
        self.pre_calls.fetch_add(1, Ordering::SeqCst);
        if !self.guarded || ctx.mark_done(self.id()) {
            self.guarded_runs.fetch_add(1, Ordering::SeqCst);
        }
        Ok(None)
    }

    fn post_modify(&self, _ctx: &mut TransactionContext, attr: &str, _entry: &dyn Entry) -> Result<()> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_post {
            panic!("post_modify exploded on {}", attr);
        }
        if self.fail_post {
            return Err(provgate_core::ProvError::SideEffect {
                attr: attr.to_string(),
                message: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Catalogue with two plain string attributes bound to one validator id
pub fn two_attr_catalogue(validator_id: &str) -> Arc<AttributeCatalogue> {
    let toml = format!(
        r#"
        [[attribute]]
        name = "x"
        type = "string"
        validator = "{id}"

        [[attribute]]
        name = "y"
        type = "string"
        validator = "{id}"
        "#,
        id = validator_id
    );
    Arc::new(AttributeCatalogue::from_toml_str(&toml).unwrap())
}
