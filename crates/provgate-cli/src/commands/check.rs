//! Dry-run pre-commit check

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use provgate_core::library::{standard_orchestrator, Collaborators};
use provgate_core::logging_facility::{self, Profile};
use provgate_core::{
    DeltaBatch, Entry, ExError, GateConfig, MemDirectory, MemEntry, OpKind, TransactionContext,
};

use tracing::info;

use super::load_catalogue;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Batch as a JSON object of mutation keys to values
    #[arg(long)]
    pub batch: PathBuf,

    /// Entry being modified (omit when creating)
    #[arg(long)]
    pub entry: Option<PathBuf>,

    /// Directory contents for domain and class-of-service lookups
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// Name of the entry being created
    #[arg(long, conflicts_with = "entry")]
    pub create: Option<String>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Attribute catalogue TOML (defaults to the built-in catalogue)
    #[arg(long)]
    pub catalogue: Option<PathBuf>,

    /// Log as JSON regardless of the configured profile
    #[arg(long)]
    pub json_logs: bool,
}

fn read(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e).into())
}

pub fn execute(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => GateConfig::load(path)?,
        None => GateConfig::default(),
    };
    logging_facility::init(if args.json_logs {
        Profile::Production
    } else {
        config.logging.profile
    });

    let catalogue = load_catalogue(args.catalogue.as_deref())?;
    let batch: DeltaBatch = serde_json::from_str(&read(&args.batch)?)?;
    let entry: Option<MemEntry> = match &args.entry {
        Some(path) => Some(serde_json::from_str(&read(path)?)?),
        None => None,
    };
    let directory = match &args.directory {
        Some(path) => MemDirectory::from_json_str(&read(path)?)?,
        None => MemDirectory::new(),
    };

    let collab = Collaborators::standalone(&config, Arc::new(directory));
    let orchestrator = standard_orchestrator(&config, catalogue, &collab)?;

    let ctx = match (&args.create, &entry) {
        (Some(name), _) => TransactionContext::for_create(name.as_str()),
        (None, Some(_)) => TransactionContext::new(OpKind::Modify),
        (None, None) => TransactionContext::new(OpKind::Create),
    };

    let prepared = orchestrator
        .apply_with(entry.as_ref().map(|e| e as &dyn Entry), batch, ctx)
        .map_err(ExError::from)?;
    info!(
        txn_id = prepared.ctx().txn_id().as_str(),
        keys = prepared.batch().len(),
        "batch accepted"
    );

    println!("{}", serde_json::to_string_pretty(prepared.batch())?);
    Ok(())
}
