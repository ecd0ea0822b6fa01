//! Standard wiring of the shipped validator library

use std::sync::Arc;

use crate::attrs;
use crate::catalogue::AttributeCatalogue;
use crate::config::GateConfig;
use crate::context::DataKey;
use crate::errors::Result;
use crate::model::directory::Directory;
use crate::model::entry::{EntryKind, MemEntry};
use crate::orchestrator::Orchestrator;
use crate::registry::{Validator, ValidatorRegistry};
use crate::side_effects::{
    EntryCache, ExtensionHook, LiveReloadTask, LocalProcess, LoggingHook, MaintenanceTask,
    ResolutionCache, StatusChangeNotifier, ToggleTask,
};
use crate::validators::enumerated::LOCALE_ID;
use crate::validators::layered_length::SIGNATURE_ID;
use crate::validators::{
    AddressWhitelist, CosReference, EnumeratedWithEscape, KeyedUniqueness, LayeredLength,
    QuotaHierarchy,
};

/// Everything the standard validators talk to outside this crate
pub struct Collaborators {
    pub directory: Arc<dyn Directory>,
    pub cache: Arc<dyn EntryCache>,
    pub process: Arc<LocalProcess>,
    pub purge_task: Arc<dyn MaintenanceTask>,
    pub freebusy_task: Arc<dyn MaintenanceTask>,
    pub hooks: Vec<Arc<dyn ExtensionHook>>,
}

impl Collaborators {
    /// Self-contained collaborators around a directory
    ///
    /// The local server entry is built from `[server]`, caches and tasks
    /// are in-process, and events go to the log.
    pub fn standalone(config: &GateConfig, directory: Arc<dyn Directory>) -> Self {
        let server = MemEntry::new(EntryKind::Server, &config.server.id, &config.server.name)
            .with_attr(attrs::SERVICES, config.server.services.clone());
        let process = Arc::new(LocalProcess::new(Arc::new(server), &config.server.services));
        process.mark_started();

        Self {
            directory,
            cache: Arc::new(ResolutionCache::new()),
            process,
            purge_task: Arc::new(ToggleTask::new("mail-purge")),
            freebusy_task: Arc::new(ToggleTask::new("freebusy-propagation")),
            hooks: vec![Arc::new(LoggingHook)],
        }
    }
}

/// Instances for every validator identity the built-in catalogue names
pub fn standard_validators(
    config: &GateConfig,
    catalogue: &Arc<AttributeCatalogue>,
    collab: &Collaborators,
) -> Vec<Arc<dyn Validator>> {
    vec![
        Arc::new(AddressWhitelist),
        Arc::new(QuotaHierarchy::new(collab.directory.clone())),
        Arc::new(KeyedUniqueness::cos_max_accounts()),
        Arc::new(KeyedUniqueness::feature_max_accounts()),
        Arc::new(EnumeratedWithEscape::new(
            LOCALE_ID,
            config.locale.supported.iter().cloned(),
            config.locale.escape_prefix.clone(),
        )),
        Arc::new(LayeredLength::new(
            SIGNATURE_ID,
            attrs::MAIL_SIGNATURE_MAX_LENGTH,
            DataKey::MaxSignatureLength,
            catalogue.clone(),
        )),
        Arc::new(CosReference::account(
            collab.directory.clone(),
            collab.cache.clone(),
        )),
        Arc::new(CosReference::domain_default(
            collab.directory.clone(),
            collab.cache.clone(),
        )),
        Arc::new(StatusChangeNotifier::account_status(collab.hooks.clone())),
        Arc::new(LiveReloadTask::mail_purge(
            collab.process.clone(),
            collab.purge_task.clone(),
        )),
        Arc::new(LiveReloadTask::freebusy_propagation(
            collab.process.clone(),
            collab.freebusy_task.clone(),
        )),
    ]
}

/// Orchestrator with the standard validators bound through `catalogue`
///
/// # Errors
///
/// `Config` when the catalogue binds an attribute to an identity the
/// standard library does not provide.
pub fn standard_orchestrator(
    config: &GateConfig,
    catalogue: Arc<AttributeCatalogue>,
    collab: &Collaborators,
) -> Result<Orchestrator> {
    let validators = standard_validators(config, &catalogue, collab);
    let registry = ValidatorRegistry::from_catalogue(&catalogue, validators)?;
    Ok(Orchestrator::new(catalogue, registry))
}
