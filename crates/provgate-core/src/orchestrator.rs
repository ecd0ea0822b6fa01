//! Two-phase modification orchestrator
//!
//! ## Protocol
//!
//! 1. `apply` normalizes the batch and runs phase 1 over every changed
//!    attribute: canonicalization, the catalogue value check, then the bound
//!    validator's `pre_modify`. Any failure aborts the whole call and the
//!    pending batch is dropped.
//! 2. The caller commits the returned batch to the directory.
//! 3. `notify` runs phase 2 (`post_modify`) against the committed entry.
//!    Failures and panics are logged per attribute and never returned.
//!
//! ## Atomicity
//!
//! `apply` takes the batch by value and hands back a new one only on
//! success, so a caller can never commit a half-validated batch.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use provgate_core::{AttributeCatalogue, DeltaBatch, OpKind, Orchestrator, ValidatorRegistry};
//!
//! let catalogue = Arc::new(AttributeCatalogue::builtin().unwrap());
//! let orchestrator = Orchestrator::new(catalogue, ValidatorRegistry::default());
//!
//! let batch = DeltaBatch::new().with("mail", "user@Bücher.example");
//! let prepared = orchestrator.apply(None, batch, OpKind::Create).unwrap();
//! assert_eq!(
//!     prepared.batch().keys().collect::<Vec<_>>(),
//!     vec!["mail"],
//! );
//! ```

use std::any::Any;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use provgate_core_types::schema::EVENT_SIDE_EFFECT_FAILED;
use tracing::{debug, warn};

use crate::catalogue::{AttributeCatalogue, IdnType};
use crate::context::{OpKind, TransactionContext};
use crate::errors::{ExError, ProvError, Result};
use crate::model::batch::{base_name, DeltaBatch};
use crate::model::entry::Entry;
use crate::mutation::AttrMutation;
use crate::registry::ValidatorRegistry;
use crate::validators::canonical;
use crate::{log_op_end, log_op_error, log_op_start};

/// Outcome of a successful phase 1: the batch to commit and the context to
/// hand back to `notify`
#[derive(Debug)]
pub struct Prepared {
    batch: DeltaBatch,
    ctx: TransactionContext,
}

impl Prepared {
    /// Batch to commit, possibly rewritten by canonicalization or validators
    pub fn batch(&self) -> &DeltaBatch {
        &self.batch
    }

    pub fn ctx(&self) -> &TransactionContext {
        &self.ctx
    }

    /// Base names of everything the batch changes, for `notify`
    pub fn changed_names(&self) -> Vec<String> {
        self.batch.base_names()
    }

    pub fn into_parts(self) -> (DeltaBatch, TransactionContext) {
        (self.batch, self.ctx)
    }
}

/// Drives phase 1 and phase 2 over a batch
#[derive(Debug, Clone)]
pub struct Orchestrator {
    catalogue: Arc<AttributeCatalogue>,
    registry: ValidatorRegistry,
}

impl Orchestrator {
    pub fn new(catalogue: Arc<AttributeCatalogue>, registry: ValidatorRegistry) -> Self {
        Self {
            catalogue,
            registry,
        }
    }

    pub fn catalogue(&self) -> &AttributeCatalogue {
        &self.catalogue
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    /// Validate a batch with a fresh transaction context
    ///
    /// `entry` is the state before the transaction, `None` when creating.
    ///
    /// # Errors
    ///
    /// The first failing check; nothing of the batch survives.
    pub fn apply(
        &self,
        entry: Option<&dyn Entry>,
        batch: DeltaBatch,
        op: OpKind,
    ) -> Result<Prepared> {
        self.apply_with(entry, batch, TransactionContext::new(op))
    }

    /// Validate a batch with a caller-seeded context
    ///
    /// Used to pass `creating_name` or data bag overrides into phase 1.
    ///
    /// # Errors
    ///
    /// The first failing check; nothing of the batch survives.
    pub fn apply_with(
        &self,
        entry: Option<&dyn Entry>,
        batch: DeltaBatch,
        mut ctx: TransactionContext,
    ) -> Result<Prepared> {
        let start = Instant::now();
        let txn_id = ctx.txn_id().as_str().to_string();
        log_op_start!(
            "apply",
            txn_id = txn_id.as_str(),
            op_kind = ctx.op_kind().as_str(),
            attr_count = batch.len()
        );

        match self.pre_modify_all(entry, batch, &mut ctx) {
            Ok(batch) => {
                log_op_end!(
                    "apply",
                    duration_ms = start.elapsed().as_millis() as u64,
                    txn_id = txn_id.as_str()
                );
                Ok(Prepared { batch, ctx })
            }
            Err(err) => {
                log_op_error!(
                    "apply",
                    ExError::from(err.clone()).with_txn_id(ctx.txn_id().clone()),
                    duration_ms = start.elapsed().as_millis() as u64,
                    txn_id = txn_id.as_str(),
                    attr = err.attr().unwrap_or_default()
                );
                Err(err)
            }
        }
    }

    fn pre_modify_all(
        &self,
        entry: Option<&dyn Entry>,
        batch: DeltaBatch,
        ctx: &mut TransactionContext,
    ) -> Result<DeltaBatch> {
        batch.check_forms()?;
        let mut pending = batch;

        // Keys are fixed here: attributes a validator adds are not visited.
        for attr in pending.base_names() {
            match self.catalogue.get(&attr) {
                None => {
                    warn!(attr = attr.as_str(), "attribute not in catalogue, no checks applied");
                }
                Some(info) => {
                    if info.deprecated {
                        warn!(attr = attr.as_str(), "modifying deprecated attribute");
                    }
                    if info.idn != IdnType::None {
                        if let Some(rewritten) = canonical::canonicalize(&attr, info.idn, &pending)? {
                            pending = rewritten;
                        }
                    }
                    let mutation = AttrMutation::from_batch(&attr, &pending)?;
                    info.check_value(&mutation, ctx.op_kind())?;
                }
            }

            if let Some(validator) = self.registry.lookup(&attr) {
                debug!(attr = attr.as_str(), validator = %validator.id(), "pre_modify");
                if let Some(rewritten) = validator.pre_modify(ctx, &attr, &pending, entry)? {
                    pending = rewritten;
                }
            }
        }
        Ok(pending)
    }

    /// Run phase 2 against the committed entry
    ///
    /// `changed` may hold prefixed mutation keys; each base name is visited
    /// once. Never fails: errors and panics are logged and the remaining
    /// attributes still run.
    pub fn notify<I>(&self, entry: &dyn Entry, changed: I, ctx: &mut TransactionContext)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let start = Instant::now();
        let txn_id = ctx.txn_id().as_str().to_string();
        log_op_start!(
            "notify",
            txn_id = txn_id.as_str(),
            entry_id = entry.id(),
            entry_kind = entry.kind().as_str()
        );

        let mut seen = HashSet::new();
        let mut failures = 0u64;
        for name in changed {
            let attr = base_name(name.as_ref()).to_string();
            if attr.is_empty() || !seen.insert(attr.to_ascii_lowercase()) {
                continue;
            }
            let Some(validator) = self.registry.lookup(&attr) else {
                continue;
            };

            let outcome = catch_unwind(AssertUnwindSafe(|| {
                validator.post_modify(ctx, &attr, entry)
            }));
            let err = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => ExError::from(err),
                Err(payload) => ExError::from(ProvError::SideEffect {
                    attr: attr.clone(),
                    message: format!("panicked: {}", panic_message(payload.as_ref())),
                }),
            };
            failures += 1;
            warn!(
                op = "notify",
                event = EVENT_SIDE_EFFECT_FAILED,
                txn_id = txn_id.as_str(),
                attr = attr.as_str(),
                validator = %validator.id(),
                err.code = err.code(),
                error = %err,
                "post-commit side effect failed"
            );
        }

        log_op_end!(
            "notify",
            duration_ms = start.elapsed().as_millis() as u64,
            txn_id = txn_id.as_str(),
            failures = failures
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
