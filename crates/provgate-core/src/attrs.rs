//! Attribute names used by the shipped validator library

pub const MAIL: &str = "mail";
pub const MAIL_ALIAS: &str = "mailAlias";
pub const MAIL_CATCH_ALL_ADDRESS: &str = "mailCatchAllAddress";
pub const DOMAIN_NAME: &str = "domainName";
pub const ALLOW_FROM_ADDRESS: &str = "allowFromAddress";

// Quotas
pub const MAIL_QUOTA: &str = "mailQuota";
pub const AGGREGATE_QUOTA: &str = "aggregateQuota";
pub const DOMAIN_AGGREGATE_QUOTA: &str = "domainAggregateQuota";

// Keyed multi-valued limits
pub const DOMAIN_COS_MAX_ACCOUNTS: &str = "domainCosMaxAccounts";
pub const DOMAIN_FEATURE_MAX_ACCOUNTS: &str = "domainFeatureMaxAccounts";

pub const PREF_LOCALE: &str = "prefLocale";
pub const MAIL_SIGNATURE: &str = "mailSignature";
pub const MAIL_SIGNATURE_MAX_LENGTH: &str = "mailSignatureMaxLength";

// Class-of-service references
pub const COS_ID: &str = "cosId";
pub const DOMAIN_DEFAULT_COS_ID: &str = "domainDefaultCosId";

pub const ACCOUNT_STATUS: &str = "accountStatus";

// Server-scoped task controls
pub const MAIL_PURGE_SLEEP_INTERVAL: &str = "mailPurgeSleepInterval";
pub const FREEBUSY_PROPAGATION_ENABLED: &str = "freebusyPropagationEnabled";
pub const SERVICES: &str = "services";

pub const IS_ADMIN_ACCOUNT: &str = "isAdminAccount";
