//! Mutation view: one attribute's change, normalized out of a delta batch
//!
//! The view hides the `+`/`-` key prefixes from validators. Scalar
//! attributes are read through `is_setting`/`is_unsetting`/`value`;
//! multi-valued attributes through `is_replacing`/`is_deleting`/
//! `is_adding`/`is_removing` and the value lists.

use crate::errors::{ProvError, Result};
use crate::model::batch::{AttrValue, DeltaBatch, KeyForm};

/// Normalized change to one base attribute
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttrMutation {
    attr: String,
    replace: Option<Vec<String>>,
    add: Option<Vec<String>>,
    remove: Option<Vec<String>>,
}

fn non_empty(value: Option<&AttrValue>) -> Vec<String> {
    value
        .map(|v| {
            v.as_slice()
                .iter()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

impl AttrMutation {
    /// Extract the change to `attr` from `batch`
    ///
    /// An attribute the batch does not mention yields an untouched view.
    ///
    /// # Errors
    ///
    /// `EmptyAttributeName` for an empty `attr`; `ConflictingMutation` when
    /// the plain form appears together with a prefixed form, or one form is
    /// spelled twice.
    pub fn from_batch(attr: &str, batch: &DeltaBatch) -> Result<Self> {
        if attr.is_empty() {
            return Err(ProvError::EmptyAttributeName);
        }

        let mut mutation = AttrMutation {
            attr: attr.to_string(),
            ..Default::default()
        };
        let mut spelled = Vec::new();
        let mut duplicate = false;

        for (form, key, value) in batch.entries_for(attr) {
            spelled.push(key.to_string());
            let slot = match form {
                KeyForm::Replace => &mut mutation.replace,
                KeyForm::Add => &mut mutation.add,
                KeyForm::Remove => &mut mutation.remove,
            };
            duplicate |= slot.is_some();
            *slot = Some(non_empty(value));
        }

        let mixed = mutation.replace.is_some() && spelled.len() > 1;
        if mixed || duplicate {
            return Err(ProvError::ConflictingMutation {
                attr: attr.to_string(),
                forms: spelled.join(", "),
            });
        }
        Ok(mutation)
    }

    /// Base attribute name as the caller spelled it
    pub fn attr(&self) -> &str {
        &self.attr
    }

    /// True when the batch mentions the attribute in any form
    pub fn is_touched(&self) -> bool {
        self.replace.is_some() || self.add.is_some() || self.remove.is_some()
    }

    // ----- scalar view -----

    pub fn is_setting(&self) -> bool {
        matches!(&self.replace, Some(v) if !v.is_empty())
    }

    pub fn is_unsetting(&self) -> bool {
        matches!(&self.replace, Some(v) if v.is_empty())
    }

    /// New scalar value when setting
    pub fn value(&self) -> Option<&str> {
        self.replace
            .as_ref()
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    // ----- multi-valued view -----

    pub fn is_replacing(&self) -> bool {
        self.is_setting()
    }

    /// Replace with an empty list: delete all values
    pub fn is_deleting(&self) -> bool {
        self.is_unsetting()
    }

    pub fn is_adding(&self) -> bool {
        matches!(&self.add, Some(v) if !v.is_empty())
    }

    pub fn is_removing(&self) -> bool {
        matches!(&self.remove, Some(v) if !v.is_empty())
    }

    /// Replacement values (empty unless replacing)
    pub fn values(&self) -> &[String] {
        self.replace.as_deref().unwrap_or_default()
    }

    pub fn added(&self) -> &[String] {
        self.add.as_deref().unwrap_or_default()
    }

    pub fn removed(&self) -> &[String] {
        self.remove.as_deref().unwrap_or_default()
    }

    /// Values entering the attribute: replacement values, else added ones
    pub fn incoming(&self) -> &[String] {
        if self.replace.is_some() {
            self.values()
        } else {
            self.added()
        }
    }

    /// True when the change uses the `+` or `-` form
    pub fn uses_prefixed_form(&self) -> bool {
        self.add.is_some() || self.remove.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_set_and_unset() {
        let batch = DeltaBatch::new()
            .with("prefLocale", "en_US")
            .with("mailSignature", "");

        let set = AttrMutation::from_batch("prefLocale", &batch).unwrap();
        assert!(set.is_setting());
        assert_eq!(set.value(), Some("en_US"));

        let unset = AttrMutation::from_batch("mailSignature", &batch).unwrap();
        assert!(unset.is_unsetting());
        assert_eq!(unset.value(), None);
    }

    #[test]
    fn test_null_value_is_unset() {
        let batch = DeltaBatch::new().with_unset("cosId");
        let m = AttrMutation::from_batch("cosId", &batch).unwrap();
        assert!(m.is_unsetting());
        assert!(m.is_touched());
    }

    #[test]
    fn test_empty_list_is_delete_all() {
        let batch = DeltaBatch::new().with("mailAlias", AttrValue::Multi(vec![]));
        let m = AttrMutation::from_batch("mailAlias", &batch).unwrap();
        assert!(m.is_deleting());
        assert!(!m.is_replacing());
    }

    #[test]
    fn test_add_and_remove_case_insensitive() {
        let batch = DeltaBatch::new()
            .with("+MAILALIAS", ["c@x.com"])
            .with("-mailalias", ["b@x.com"]);
        let m = AttrMutation::from_batch("mailAlias", &batch).unwrap();
        assert!(m.is_adding());
        assert!(m.is_removing());
        assert_eq!(m.added(), ["c@x.com".to_string()]);
        assert_eq!(m.removed(), ["b@x.com".to_string()]);
        assert_eq!(m.incoming(), m.added());
    }

    #[test]
    fn test_plain_with_prefixed_rejected() {
        let batch = DeltaBatch::new()
            .with("mail", "a@x.com")
            .with("+MAIL", "b@x.com");
        let err = AttrMutation::from_batch("mail", &batch).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ExErrorKind::InvalidRequest);
    }

    #[test]
    fn test_untouched_attribute() {
        let m = AttrMutation::from_batch("cosId", &DeltaBatch::new()).unwrap();
        assert!(!m.is_touched());
        assert!(m.incoming().is_empty());
    }
}
