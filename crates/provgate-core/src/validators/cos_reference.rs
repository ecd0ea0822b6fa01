//! Class-of-service references
//!
//! An account's or domain's class-of-service id must name an existing
//! class of service. Lookup failures surface as backend failures rather
//! than missing references.

use std::sync::Arc;

use tracing::debug;

use crate::context::TransactionContext;
use crate::errors::{ProvError, Result};
use crate::model::batch::DeltaBatch;
use crate::model::directory::Directory;
use crate::model::entry::Entry;
use crate::mutation::AttrMutation;
use crate::registry::{Validator, ValidatorId};
use crate::side_effects::cache::{CacheKey, EntryCache};

pub const ACCOUNT_COS_ID: &str = "account_cos_reference";
pub const DOMAIN_DEFAULT_COS_ID: &str = "domain_default_cos_reference";

/// Class-of-service reference: must resolve before commit, and the cached
/// resolution on the entry is dropped after it
pub struct CosReference {
    id: ValidatorId,
    cache_key: CacheKey,
    directory: Arc<dyn Directory>,
    cache: Arc<dyn EntryCache>,
}

impl CosReference {
    pub fn new(
        id: &str,
        cache_key: CacheKey,
        directory: Arc<dyn Directory>,
        cache: Arc<dyn EntryCache>,
    ) -> Self {
        Self {
            id: ValidatorId::new(id),
            cache_key,
            directory,
            cache,
        }
    }

    pub fn account(directory: Arc<dyn Directory>, cache: Arc<dyn EntryCache>) -> Self {
        Self::new(ACCOUNT_COS_ID, CacheKey::AccountCos, directory, cache)
    }

    pub fn domain_default(directory: Arc<dyn Directory>, cache: Arc<dyn EntryCache>) -> Self {
        Self::new(DOMAIN_DEFAULT_COS_ID, CacheKey::DomainDefaultCos, directory, cache)
    }
}

impl Validator for CosReference {
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
        let Some(cos_id) = mutation.value() else {
            return Ok(None);
        };
        if self.directory.cos_by_id(cos_id)?.is_none() {
            return Err(ProvError::ReferenceNotFound {
                attr: attr.to_string(),
                kind: "cos".to_string(),
                value: cos_id.to_string(),
            });
        }
        Ok(None)
    }

    fn post_modify(&self, _ctx: &mut TransactionContext, attr: &str, entry: &dyn Entry) -> Result<()> {
        debug!(attr, entry_id = entry.id(), "dropping cached cos resolution");
        self.cache.invalidate(entry.id(), self.cache_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OpKind;
    use crate::model::directory::{MemDirectory, UnreachableDirectory};
    use crate::model::entry::{EntryKind, MemEntry};
    use crate::side_effects::cache::ResolutionCache;

    fn directory() -> Arc<dyn Directory> {
        Arc::new(MemDirectory::new().with_cos(MemEntry::new(EntryKind::Cos, "cos-1", "default")))
    }

    #[test]
    fn test_existing_cos_accepted_unset_accepted() {
        let v = CosReference::account(directory(), Arc::new(ResolutionCache::new()));
        let mut ctx = TransactionContext::new(OpKind::Modify);
        assert!(v.pre_modify(&mut ctx, "cosId", &DeltaBatch::new().with("cosId", "cos-1"), None).is_ok());
        assert!(v.pre_modify(&mut ctx, "cosId", &DeltaBatch::new().with_unset("cosId"), None).is_ok());
    }

    #[test]
    fn test_unknown_cos_not_found() {
        let v = CosReference::account(directory(), Arc::new(ResolutionCache::new()));
        let mut ctx = TransactionContext::new(OpKind::Modify);
        let err = v
            .pre_modify(&mut ctx, "cosId", &DeltaBatch::new().with("cosId", "cos-9"), None)
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ExErrorKind::NotFound);
    }

    #[test]
    fn test_backend_failure() {
        let v = CosReference::account(Arc::new(UnreachableDirectory), Arc::new(ResolutionCache::new()));
        let mut ctx = TransactionContext::new(OpKind::Modify);
        let err = v
            .pre_modify(&mut ctx, "cosId", &DeltaBatch::new().with("cosId", "cos-1"), None)
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ExErrorKind::Failure);
    }

    #[test]
    fn test_post_modify_invalidates() {
        let cache = Arc::new(ResolutionCache::new());
        cache.put("dom-1", CacheKey::DomainDefaultCos, "cos-0");
        let v = CosReference::domain_default(directory(), cache.clone());
        let domain = MemEntry::new(EntryKind::Domain, "dom-1", "x.com");
        let mut ctx = TransactionContext::new(OpKind::Modify);

        v.post_modify(&mut ctx, "domainDefaultCosId", &domain).unwrap();

        assert_eq!(cache.get("dom-1", CacheKey::DomainDefaultCos), None);
    }
}
