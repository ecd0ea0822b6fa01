//! Enumerated values
//!
//! Scalar attributes restricted to a configured vocabulary, such as the
//! supported locales, with a prefix that lets private values through.

use std::collections::BTreeSet;

use crate::context::TransactionContext;
use crate::errors::{ProvError, Result};
use crate::model::batch::DeltaBatch;
use crate::model::entry::Entry;
use crate::mutation::AttrMutation;
use crate::registry::{Validator, ValidatorId};

pub const LOCALE_ID: &str = "locale_vocabulary";

/// Closed vocabulary with an escape hatch for private values
///
/// A new value passes when it is empty, starts with the escape prefix, or
/// is exactly one of the vocabulary entries.
#[derive(Debug, Clone)]
pub struct EnumeratedWithEscape {
    id: ValidatorId,
    vocabulary: BTreeSet<String>,
    escape_prefix: String,
}

impl EnumeratedWithEscape {
    pub fn new<I, S>(id: &str, vocabulary: I, escape_prefix: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: ValidatorId::new(id),
            vocabulary: vocabulary.into_iter().map(Into::into).collect(),
            escape_prefix: escape_prefix.into(),
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        value.is_empty()
            || (!self.escape_prefix.is_empty() && value.starts_with(&self.escape_prefix))
            || self.vocabulary.contains(value)
    }
}

impl Validator for EnumeratedWithEscape {
    fn id(&self) -> ValidatorId {
        self.id.clone()
    }

    fn pre_modify(
        &self,
        _ctx: &mut TransactionContext,
        attr: &str,
        batch: &DeltaBatch,
        _entry: Option<&dyn Entry>,
    ) -> Result<Option<DeltaBatch>> {
        let mutation = AttrMutation::from_batch(attr, batch)?;
        match mutation.incoming().iter().find(|v| !self.accepts(v)) {
            Some(bad) => Err(ProvError::NotInVocabulary {
                attr: attr.to_string(),
                value: bad.clone(),
            }),
            None => Ok(None),
        }
    }
}
