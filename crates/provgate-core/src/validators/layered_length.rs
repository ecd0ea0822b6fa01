//! Length limit with layered sources
//!
//! The effective maximum is taken from the first source that has one:
//!
//! 1. a data bag override seeded by the caller
//! 2. the sibling max-length attribute changed in the same batch
//! 3. the entry's stored limit (inherited defaults included), else the
//!    catalogue default
//!
//! With no entry and neither of the first two, the check is skipped. A
//! limit of 0 means unlimited. Length counts characters, not bytes.

use std::sync::Arc;

use tracing::debug;

use crate::catalogue::AttributeCatalogue;
use crate::context::{DataKey, TransactionContext};
use crate::errors::{ProvError, Result};
use crate::model::batch::DeltaBatch;
use crate::model::entry::Entry;
use crate::mutation::AttrMutation;
use crate::registry::{Validator, ValidatorId};

pub const SIGNATURE_ID: &str = "signature_length";

pub struct LayeredLength {
    id: ValidatorId,
    limit_attr: String,
    override_key: DataKey,
    catalogue: Arc<AttributeCatalogue>,
}

impl LayeredLength {
    pub fn new(
        id: &str,
        limit_attr: &str,
        override_key: DataKey,
        catalogue: Arc<AttributeCatalogue>,
    ) -> Self {
        Self {
            id: ValidatorId::new(id),
            limit_attr: limit_attr.to_string(),
            override_key,
            catalogue,
        }
    }

    fn parse_limit(&self, raw: &str) -> Result<u64> {
        raw.trim()
            .parse()
            .map_err(|_| ProvError::invalid_value(&self.limit_attr, raw, "length limit must be a non-negative integer"))
    }

    /// `None` means no source applies and the check is skipped
    fn effective_limit(
        &self,
        ctx: &TransactionContext,
        batch: &DeltaBatch,
        entry: Option<&dyn Entry>,
    ) -> Result<Option<u64>> {
        if let Some(raw) = ctx.data(self.override_key) {
            return self.parse_limit(raw).map(Some);
        }

        let sibling = AttrMutation::from_batch(&self.limit_attr, batch)?;
        if let Some(raw) = sibling.value() {
            return self.parse_limit(raw).map(Some);
        }

        let Some(entry) = entry else {
            return Ok(None);
        };
        match entry
            .get_single(&self.limit_attr)
            .or_else(|| self.catalogue.default_value(&self.limit_attr).map(str::to_string))
        {
            Some(raw) => self.parse_limit(&raw).map(Some),
            None => Ok(None),
        }
    }
}

impl Validator for LayeredLength {
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
        let mutation = AttrMutation::from_batch(attr, batch)?;
        let Some(value) = mutation.value() else {
            return Ok(None);
        };

        let Some(max) = self.effective_limit(ctx, batch, entry)? else {
            debug!(attr, "no length limit in effect");
            return Ok(None);
        };
        let length = value.chars().count();
        if max > 0 && length as u64 > max {
            return Err(ProvError::ValueTooLong {
                attr: attr.to_string(),
                length,
                max,
            });
        }
        Ok(None)
    }
}
