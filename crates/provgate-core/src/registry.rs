//! Validator trait and registry
//!
//! The registry maps attribute names to the validator bound to them. It is
//! built once from the catalogue's bindings plus the available validator
//! instances, and is read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::catalogue::AttributeCatalogue;
use crate::context::TransactionContext;
use crate::errors::{ProvError, Result};
use crate::model::batch::DeltaBatch;
use crate::model::entry::Entry;

/// Stable identity of a validator, as named in the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidatorId(String);

impl ValidatorId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ValidatorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rule (phase 1) and/or reaction (phase 2) bound to one or more attributes
///
/// Validators hold no per-transaction state; anything that must survive
/// between calls goes into the [`TransactionContext`].
pub trait Validator: Send + Sync {
    fn id(&self) -> ValidatorId;

    /// Check (and optionally rewrite) a pending change before commit
    ///
    /// Returning `Some(batch)` replaces the pending batch for the rest of
    /// the transaction. `entry` is `None` when creating.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole transaction.
    fn pre_modify(
        &self,
        _ctx: &mut TransactionContext,
        _attr: &str,
        _batch: &DeltaBatch,
        _entry: Option<&dyn Entry>,
    ) -> Result<Option<DeltaBatch>> {
        Ok(None)
    }

    /// React to a committed change; `entry` is the post-commit state
    ///
    /// # Errors
    ///
    /// Errors are logged by the orchestrator and never reach the caller.
    fn post_modify(
        &self,
        _ctx: &mut TransactionContext,
        _attr: &str,
        _entry: &dyn Entry,
    ) -> Result<()> {
        Ok(())
    }
}

/// Attribute name → bound validator
#[derive(Default, Clone)]
pub struct ValidatorRegistry {
    bindings: HashMap<String, Arc<dyn Validator>>,
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<(&String, ValidatorId)> =
            self.bindings.iter().map(|(k, v)| (k, v.id())).collect();
        names.sort();
        f.debug_struct("ValidatorRegistry")
            .field("bindings", &names)
            .finish()
    }
}

impl ValidatorRegistry {
    /// Bind every catalogued attribute that names a validator
    ///
    /// # Errors
    ///
    /// `Config` when a binding names an identity with no instance, or two
    /// instances share an identity.
    pub fn from_catalogue(
        catalogue: &AttributeCatalogue,
        validators: Vec<Arc<dyn Validator>>,
    ) -> Result<Self> {
        let mut by_id: HashMap<ValidatorId, Arc<dyn Validator>> = HashMap::new();
        for v in validators {
            let id = v.id();
            if by_id.insert(id.clone(), v).is_some() {
                return Err(ProvError::Config {
                    message: format!("validator {} registered twice", id),
                });
            }
        }

        let mut bindings = HashMap::new();
        for info in catalogue.iter() {
            let Some(id) = &info.validator else {
                continue;
            };
            let validator = by_id.get(id).ok_or_else(|| ProvError::Config {
                message: format!("attribute {} is bound to unknown validator {}", info.name, id),
            })?;
            bindings.insert(info.name.to_ascii_lowercase(), validator.clone());
        }
        Ok(Self { bindings })
    }

    /// Bind directly, bypassing the catalogue
    pub fn with_binding(mut self, attr: &str, validator: Arc<dyn Validator>) -> Self {
        self.bindings.insert(attr.to_ascii_lowercase(), validator);
        self
    }

    pub fn lookup(&self, attr: &str) -> Option<&Arc<dyn Validator>> {
        self.bindings.get(&attr.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
