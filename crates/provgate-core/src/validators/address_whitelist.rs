//! Address whitelist
//!
//! Attributes such as `allowFromAddress` may only name addresses the entry
//! already owns. The check runs on the values a change brings in; removals
//! and unsets always pass.

use tracing::debug;

use crate::attrs;
use crate::context::TransactionContext;
use crate::errors::{ProvError, Result};
use crate::model::batch::DeltaBatch;
use crate::model::entry::Entry;
use crate::mutation::AttrMutation;
use crate::registry::{Validator, ValidatorId};

pub const ID: &str = "address_whitelist";

/// Restricts an address attribute to the owning entry's own addresses
///
/// Legal values are the entry's primary address and its `mailAlias`
/// values. When creating, only the caller-declared name is legal (and
/// nothing, if no name was declared). Comparison ignores case.
#[derive(Debug, Default, Clone, Copy)]
pub struct AddressWhitelist;

impl AddressWhitelist {
    fn allowed(ctx: &TransactionContext, entry: Option<&dyn Entry>) -> Vec<String> {
        match entry {
            Some(e) => std::iter::once(e.name().to_string())
                .chain(e.get_multi(attrs::MAIL_ALIAS))
                .map(|a| a.to_lowercase())
                .collect(),
            None => ctx
                .creating_name()
                .map(|n| vec![n.to_lowercase()])
                .unwrap_or_default(),
        }
    }
}

impl Validator for AddressWhitelist {
    fn id(&self) -> ValidatorId {
        ValidatorId::new(ID)
    }

    fn pre_modify(
        &self,
        ctx: &mut TransactionContext,
        attr: &str,
        batch: &DeltaBatch,
        entry: Option<&dyn Entry>,
    ) -> Result<Option<DeltaBatch>> {
        let mutation = AttrMutation::from_batch(attr, batch)?;
        let candidates = mutation.incoming();
        if candidates.is_empty() {
            return Ok(None);
        }

        let allowed = Self::allowed(ctx, entry);
        debug!(attr, allowed = allowed.len(), "checking address whitelist");
        if let Some(bad) = candidates
            .iter()
            .find(|v| !allowed.contains(&v.to_lowercase()))
        {
            return Err(ProvError::AddressNotAllowed {
                attr: attr.to_string(),
                value: bad.clone(),
            });
        }
        Ok(None)
    }
}
