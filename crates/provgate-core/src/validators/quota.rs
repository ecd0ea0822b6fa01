//! Quota hierarchy
//!
//! Keeps an account's per-mailbox quota within its aggregate quota, and the
//! aggregate within the limit of the domain the account lives in. The
//! domain is resolved through the [`Directory`] by the account's address.

use std::sync::Arc;

use tracing::debug;

use crate::attrs;
use crate::context::TransactionContext;
use crate::errors::{ProvError, Result};
use crate::model::batch::DeltaBatch;
use crate::model::directory::Directory;
use crate::model::entry::Entry;
use crate::mutation::AttrMutation;
use crate::registry::{Validator, ValidatorId};

pub const ID: &str = "quota_hierarchy";

/// Enforces `mailQuota <= aggregateQuota <= domainAggregateQuota`
///
/// Bound to both account quotas; runs once per transaction whichever of
/// them changed. Each side uses the pending value when the batch changes
/// it, else the stored one. `0` means unlimited and skips every comparison
/// it takes part in.
pub struct QuotaHierarchy {
    directory: Arc<dyn Directory>,
}

impl QuotaHierarchy {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    fn domain_limit(&self, account_name: &str) -> Result<u64> {
        let Some((_, domain_name)) = account_name.rsplit_once('@') else {
            return Ok(0);
        };
        let domain = self
            .directory
            .domain_by_name(domain_name)?
            .ok_or_else(|| ProvError::DomainNotFound {
                name: domain_name.to_string(),
            })?;
        stored_quota(domain.as_ref(), attrs::DOMAIN_AGGREGATE_QUOTA)
    }
}

fn parse_quota(attr: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| ProvError::invalid_value(attr, raw, "quota must be a non-negative integer"))
}

fn stored_quota(entry: &dyn Entry, attr: &str) -> Result<u64> {
    entry
        .get_single(attr)
        .map_or(Ok(0), |raw| parse_quota(attr, &raw))
}

/// Pending value if the batch touches `attr`, else the stored one
fn effective_quota(attr: &str, batch: &DeltaBatch, entry: Option<&dyn Entry>) -> Result<u64> {
    let mutation = AttrMutation::from_batch(attr, batch)?;
    if mutation.is_touched() {
        return mutation.value().map_or(Ok(0), |raw| parse_quota(attr, raw));
    }
    entry.map_or(Ok(0), |e| stored_quota(e, attr))
}

impl Validator for QuotaHierarchy {
    fn id(&self) -> ValidatorId {
        ValidatorId::new(ID)
    }

    fn pre_modify(
        &self,
        ctx: &mut TransactionContext,
        _attr: &str,
        batch: &DeltaBatch,
        entry: Option<&dyn Entry>,
    ) -> Result<Option<DeltaBatch>> {
        if !ctx.mark_done(self.id()) {
            return Ok(None);
        }

        let mail = effective_quota(attrs::MAIL_QUOTA, batch, entry)?;
        let aggregate = effective_quota(attrs::AGGREGATE_QUOTA, batch, entry)?;
        debug!(mail, aggregate, "checking quota hierarchy");

        if mail > 0 && aggregate > 0 && mail > aggregate {
            return Err(ProvError::QuotaExceeded {
                attr: attrs::MAIL_QUOTA.to_string(),
                value: mail,
                bound_attr: attrs::AGGREGATE_QUOTA.to_string(),
                bound: aggregate,
            });
        }
        if aggregate == 0 {
            return Ok(None);
        }

        let owner = entry
            .map(|e| e.name().to_string())
            .or_else(|| ctx.creating_name().map(str::to_string));
        let Some(owner) = owner else {
            return Ok(None);
        };
        let domain = self.domain_limit(&owner)?;
        if domain > 0 && aggregate > domain {
            return Err(ProvError::QuotaExceeded {
                attr: attrs::AGGREGATE_QUOTA.to_string(),
                value: aggregate,
                bound_attr: attrs::DOMAIN_AGGREGATE_QUOTA.to_string(),
                bound: domain,
            });
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OpKind;
    use crate::model::directory::{MemDirectory, UnreachableDirectory};
    use crate::model::entry::{EntryKind, MemEntry};

    fn directory(domain_quota: &str) -> Arc<dyn Directory> {
        Arc::new(MemDirectory::new().with_domain(
            MemEntry::new(EntryKind::Domain, "dom-1", "x.com")
                .with_attr(attrs::DOMAIN_AGGREGATE_QUOTA, domain_quota),
        ))
    }

    fn account() -> MemEntry {
        MemEntry::new(EntryKind::Account, "acct-1", "a@x.com")
            .with_attr(attrs::MAIL_QUOTA, "100")
            .with_attr(attrs::AGGREGATE_QUOTA, "500")
    }

    fn check(v: &QuotaHierarchy, batch: DeltaBatch, entry: Option<&dyn Entry>) -> Result<Option<DeltaBatch>> {
        let mut ctx = TransactionContext::new(OpKind::Modify);
        v.pre_modify(&mut ctx, attrs::MAIL_QUOTA, &batch, entry)
    }

    #[test]
    fn test_pending_mail_quota_checked_against_stored_aggregate() {
        let v = QuotaHierarchy::new(directory("1000"));
        let err = check(&v, DeltaBatch::new().with(attrs::MAIL_QUOTA, "600"), Some(&account()))
            .unwrap_err();
        assert!(matches!(err, ProvError::QuotaExceeded { bound: 500, .. }));
    }

    #[test]
    fn test_pending_values_on_both_sides() {
        let v = QuotaHierarchy::new(directory("1000"));
        let batch = DeltaBatch::new()
            .with(attrs::MAIL_QUOTA, "600")
            .with(attrs::AGGREGATE_QUOTA, "700");
        assert!(check(&v, batch, Some(&account())).is_ok());
    }

    #[test]
    fn test_aggregate_bounded_by_domain() {
        let v = QuotaHierarchy::new(directory("1000"));
        let err = check(&v, DeltaBatch::new().with(attrs::AGGREGATE_QUOTA, "2000"), Some(&account()))
            .unwrap_err();
        assert!(matches!(
            err,
            ProvError::QuotaExceeded { ref bound_attr, bound: 1000, .. } if bound_attr == attrs::DOMAIN_AGGREGATE_QUOTA
        ));
    }

    #[test]
    fn test_zero_means_unlimited() {
        let v = QuotaHierarchy::new(directory("0"));
        assert!(check(&v, DeltaBatch::new().with(attrs::AGGREGATE_QUOTA, "99999"), Some(&account())).is_ok());
        assert!(check(&v, DeltaBatch::new().with(attrs::AGGREGATE_QUOTA, "0").with(attrs::MAIL_QUOTA, "99999"), Some(&account())).is_ok());
    }

    #[test]
    fn test_missing_domain_is_not_found() {
        let v = QuotaHierarchy::new(Arc::new(MemDirectory::new()));
        let err = check(&v, DeltaBatch::new().with(attrs::AGGREGATE_QUOTA, "10"), Some(&account()))
            .unwrap_err();
        assert_eq!(err, ProvError::DomainNotFound { name: "x.com".into() });
    }

    #[test]
    fn test_backend_failure_surfaces() {
        let v = QuotaHierarchy::new(Arc::new(UnreachableDirectory));
        let err = check(&v, DeltaBatch::new().with(attrs::AGGREGATE_QUOTA, "10"), Some(&account()))
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ExErrorKind::Failure);
    }

    #[test]
    fn test_runs_once_per_transaction() {
        let v = QuotaHierarchy::new(Arc::new(UnreachableDirectory));
        let mut ctx = TransactionContext::new(OpKind::Modify);
        let batch = DeltaBatch::new().with(attrs::AGGREGATE_QUOTA, "10");
        assert!(v.pre_modify(&mut ctx, attrs::AGGREGATE_QUOTA, &batch, Some(&account())).is_err());
        // second attribute of the same transaction: guarded body skipped
        assert!(v.pre_modify(&mut ctx, attrs::MAIL_QUOTA, &batch, Some(&account())).is_ok());
    }
}
