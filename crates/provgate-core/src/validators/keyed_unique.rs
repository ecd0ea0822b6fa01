//! Per-key uniqueness inside a multi-valued attribute
//!
//! Values are `key:payload` tokens (e.g. a class-of-service id and an
//! account limit). After the change is resolved against the stored values
//! no two tokens may share a key. New tokens must be well formed; stored
//! tokens that are not are ignored so legacy data does not block edits.

use crate::context::TransactionContext;
use crate::errors::{ProvError, Result};
use crate::model::batch::DeltaBatch;
use crate::model::entry::Entry;
use crate::mutation::AttrMutation;
use crate::registry::{Validator, ValidatorId};
use crate::value_set::ValueSet;

pub const COS_MAX_ACCOUNTS_ID: &str = "keyed_unique_cos_max_accounts";
pub const FEATURE_MAX_ACCOUNTS_ID: &str = "keyed_unique_feature_max_accounts";

/// What the payload after the colon must look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadRule {
    Any,
    /// Non-negative integer
    Count,
}

#[derive(Debug, Clone)]
pub struct KeyedUniqueness {
    id: ValidatorId,
    payload: PayloadRule,
}

/// Split `key:payload`; `None` unless both halves are non-empty
pub fn split_token(value: &str) -> Option<(&str, &str)> {
    value
        .split_once(':')
        .filter(|(k, p)| !k.is_empty() && !p.is_empty())
}

impl KeyedUniqueness {
    pub fn new(id: &str, payload: PayloadRule) -> Self {
        Self {
            id: ValidatorId::new(id),
            payload,
        }
    }

    /// `cosId:maxAccounts` on domains
    pub fn cos_max_accounts() -> Self {
        Self::new(COS_MAX_ACCOUNTS_ID, PayloadRule::Count)
    }

    /// `feature:maxAccounts` on domains
    pub fn feature_max_accounts() -> Self {
        Self::new(FEATURE_MAX_ACCOUNTS_ID, PayloadRule::Count)
    }

    fn check_new_token(&self, attr: &str, value: &str) -> Result<()> {
        let (_, payload) = split_token(value).ok_or_else(|| ProvError::MalformedToken {
            attr: attr.to_string(),
            value: value.to_string(),
        })?;
        match self.payload {
            PayloadRule::Any => Ok(()),
            PayloadRule::Count => payload
                .parse::<u64>()
                .map(|_| ())
                .map_err(|_| ProvError::invalid_value(attr, value, "count must be a non-negative integer")),
        }
    }
}

impl Validator for KeyedUniqueness {
    fn id(&self) -> ValidatorId {
        self.id.clone()
    }

    fn pre_modify(
        &self,
        _ctx: &mut TransactionContext,
        attr: &str,
        batch: &DeltaBatch,
        entry: Option<&dyn Entry>,
    ) -> Result<Option<DeltaBatch>> {
        let mutation = AttrMutation::from_batch(attr, batch)?;
        if !mutation.is_touched() {
            return Ok(None);
        }
        for value in mutation.incoming() {
            self.check_new_token(attr, value)?;
        }

        let resolved = ValueSet::from_entry(entry, attr).apply(&mutation);
        resolved.check_unique_by(attr, |v| split_token(v).map(|(k, _)| k.to_string()))?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OpKind;
    use crate::model::entry::{EntryKind, MemEntry};

    const ATTR: &str = "domainCosMaxAccounts";

    fn run(batch: DeltaBatch, entry: &MemEntry) -> Result<Option<DeltaBatch>> {
        let mut ctx = TransactionContext::new(OpKind::Modify);
        KeyedUniqueness::cos_max_accounts().pre_modify(&mut ctx, ATTR, &batch, Some(entry))
    }

    #[test]
    fn test_split_token() {
        assert_eq!(split_token("a:1"), Some(("a", "1")));
        assert_eq!(split_token("a:b:c"), Some(("a", "b:c")));
        assert_eq!(split_token("a:"), None);
        assert_eq!(split_token(":1"), None);
        assert_eq!(split_token("a"), None);
    }

    #[test]
    fn test_malformed_new_token_rejected() {
        let domain = MemEntry::new(EntryKind::Domain, "d", "x.com");
        let err = run(DeltaBatch::new().with("+domainCosMaxAccounts", ["nocolon"]), &domain).unwrap_err();
        assert!(matches!(err, ProvError::MalformedToken { .. }));
    }

    #[test]
    fn test_malformed_stored_token_ignored() {
        let domain = MemEntry::new(EntryKind::Domain, "d", "x.com").with_attr(ATTR, ["legacy", "legacy2"]);
        assert!(run(DeltaBatch::new().with("+domainCosMaxAccounts", ["a:1"]), &domain).is_ok());
    }

    #[test]
    fn test_count_payload_enforced() {
        let domain = MemEntry::new(EntryKind::Domain, "d", "x.com");
        let err = run(DeltaBatch::new().with(ATTR, ["a:many"]), &domain).unwrap_err();
        assert!(matches!(err, ProvError::InvalidValue { .. }));
    }

    #[test]
    fn test_duplicate_keys_within_replacement() {
        let domain = MemEntry::new(EntryKind::Domain, "d", "x.com");
        let err = run(DeltaBatch::new().with(ATTR, ["a:1", "a:2"]), &domain).unwrap_err();
        assert!(matches!(err, ProvError::KeyCollision { ref key, .. } if key == "a"));
    }

    #[test]
    fn test_any_payload_rule() {
        let v = KeyedUniqueness::new("free_form", PayloadRule::Any);
        let mut ctx = TransactionContext::new(OpKind::Create);
        let batch = DeltaBatch::new().with("x", ["k:anything"]);
        assert!(v.pre_modify(&mut ctx, "x", &batch, None).is_ok());
    }
}
