use provgate_core_types::TxnId;
use thiserror::Error;

/// Result type alias using ProvError
pub type Result<T> = std::result::Result<T, ProvError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers (admin console,
/// provisioning API) can switch on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Malformed value, conflicting mutation forms, non-whitelisted or
    /// non-enumerated value, format violation
    InvalidRequest,
    /// An infrastructure-dependent check failed (directory backend, probe)
    Failure,
    /// The acting principal lacks rights implied by the new value
    PermDenied,
    /// A referenced value does not resolve to an existing related object
    NotFound,

    // Setup
    Config,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidRequest => "ERR_INVALID_REQUEST",
            ExErrorKind::Failure => "ERR_FAILURE",
            ExErrorKind::PermDenied => "ERR_PERM_DENIED",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus the modification context (operation,
/// attribute, entry, transaction) for programmatic handling and logging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    attr: Option<String>,
    entry_id: Option<String>,
    txn_id: Option<TxnId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            attr: None,
            entry_id: None,
            txn_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add attribute context
    pub fn with_attr(mut self, attr: impl Into<String>) -> Self {
        self.attr = Some(attr.into());
        self
    }

    /// Add entry ID context
    pub fn with_entry_id(mut self, id: impl Into<String>) -> Self {
        self.entry_id = Some(id.into());
        self
    }

    /// Add transaction ID context
    pub fn with_txn_id(mut self, txn_id: TxnId) -> Self {
        self.txn_id = Some(txn_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the attribute context, if any
    pub fn attr(&self) -> Option<&str> {
        self.attr.as_deref()
    }

    /// Get the entry ID context, if any
    pub fn entry_id(&self) -> Option<&str> {
        self.entry_id.as_deref()
    }

    /// Get the transaction ID context, if any
    pub fn txn_id(&self) -> Option<&TxnId> {
        self.txn_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(attr) = &self.attr {
            write!(f, " (attr: {})", attr)?;
        }
        if let Some(entry_id) = &self.entry_id {
            write!(f, " (entry_id: {})", entry_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for attribute modification
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProvError {
    // ===== Batch Shape =====
    /// A mutation key with no attribute name (`""`, `"+"`, `"-"`)
    #[error("Empty attribute name in modification batch")]
    EmptyAttributeName,

    /// Plain and prefixed forms of one base name in the same batch
    #[error("Conflicting mutation forms for attribute {attr}: {forms}")]
    ConflictingMutation { attr: String, forms: String },

    // ===== Value Checks =====
    /// Value fails the attribute's declared type or format
    #[error("Invalid value '{value}' for attribute {attr}: {reason}")]
    InvalidValue {
        attr: String,
        value: String,
        reason: String,
    },

    /// More than one value, or an add/remove form, on a single-valued attribute
    #[error("Attribute {attr} is single-valued")]
    SingleValued { attr: String },

    /// Attribute cannot be changed once the entry exists
    #[error("Attribute {attr} is immutable")]
    ImmutableAttribute { attr: String },

    /// Value is not one of the owning entry's own addresses
    #[error("Address {value} is not allowed in {attr}: not an address of this entry")]
    AddressNotAllowed { attr: String, value: String },

    /// Two resolved tokens share the same key
    #[error("Duplicate key '{key}' in {attr}: '{first}' and '{second}'")]
    KeyCollision {
        attr: String,
        key: String,
        first: String,
        second: String,
    },

    /// Token lacks the `key:payload` shape
    #[error("Malformed value '{value}' for {attr}: expected key:payload")]
    MalformedToken { attr: String, value: String },

    /// Value outside the closed vocabulary
    #[error("Value '{value}' for {attr} is not a recognised value")]
    NotInVocabulary { attr: String, value: String },

    /// Value longer than the effective maximum length
    #[error("Value for {attr} is {length} characters, exceeds limit of {max}")]
    ValueTooLong {
        attr: String,
        length: usize,
        max: u64,
    },

    /// Lower quota bound exceeds the upper one
    #[error("{attr}={value} exceeds {bound_attr}={bound}")]
    QuotaExceeded {
        attr: String,
        value: u64,
        bound_attr: String,
        bound: u64,
    },

    /// Value cannot be converted to its ASCII-compatible form
    #[error("Cannot canonicalize '{value}' for {attr}: {reason}")]
    Canonicalization {
        attr: String,
        value: String,
        reason: String,
    },

    // ===== Related Objects =====
    /// Value names a related object that does not exist
    #[error("{attr} references unknown {kind} '{value}'")]
    ReferenceNotFound {
        attr: String,
        kind: String,
        value: String,
    },

    /// Owning domain of an account could not be found
    #[error("Domain not found: {name}")]
    DomainNotFound { name: String },

    /// Directory or other backend call failed
    #[error("Backend failure in {op}: {message}")]
    BackendFailure { op: String, message: String },

    /// Post-commit reaction failed (logged, never surfaced to the caller)
    #[error("Side effect for {attr} failed: {message}")]
    SideEffect { attr: String, message: String },

    // ===== Generic Errors =====
    /// Bad configuration or catalogue
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization error (JSON/TOML encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ProvError {
    /// Classification of this error in the canonical taxonomy
    pub fn kind(&self) -> ExErrorKind {
        match self {
            ProvError::EmptyAttributeName
            | ProvError::ConflictingMutation { .. }
            | ProvError::InvalidValue { .. }
            | ProvError::SingleValued { .. }
            | ProvError::ImmutableAttribute { .. }
            | ProvError::AddressNotAllowed { .. }
            | ProvError::KeyCollision { .. }
            | ProvError::MalformedToken { .. }
            | ProvError::NotInVocabulary { .. }
            | ProvError::ValueTooLong { .. }
            | ProvError::QuotaExceeded { .. }
            | ProvError::Canonicalization { .. } => ExErrorKind::InvalidRequest,
            ProvError::ReferenceNotFound { .. } | ProvError::DomainNotFound { .. } => {
                ExErrorKind::NotFound
            }
            ProvError::BackendFailure { .. } | ProvError::SideEffect { .. } => {
                ExErrorKind::Failure
            }
            ProvError::Config { .. } => ExErrorKind::Config,
            ProvError::Serialization { .. } => ExErrorKind::Serialization,
            ProvError::Internal { .. } => ExErrorKind::Internal,
        }
    }

    /// Attribute the error is about, if any
    pub fn attr(&self) -> Option<&str> {
        match self {
            ProvError::ConflictingMutation { attr, .. }
            | ProvError::InvalidValue { attr, .. }
            | ProvError::SingleValued { attr }
            | ProvError::ImmutableAttribute { attr }
            | ProvError::AddressNotAllowed { attr, .. }
            | ProvError::KeyCollision { attr, .. }
            | ProvError::MalformedToken { attr, .. }
            | ProvError::NotInVocabulary { attr, .. }
            | ProvError::ValueTooLong { attr, .. }
            | ProvError::QuotaExceeded { attr, .. }
            | ProvError::Canonicalization { attr, .. }
            | ProvError::ReferenceNotFound { attr, .. }
            | ProvError::SideEffect { attr, .. } => Some(attr),
            _ => None,
        }
    }

    pub(crate) fn invalid_value(
        attr: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ProvError::InvalidValue {
            attr: attr.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Conversion from ProvError to ExError
impl From<ProvError> for ExError {
    fn from(err: ProvError) -> Self {
        let mut ex = ExError::new(err.kind()).with_message(err.to_string());
        if let Some(attr) = err.attr() {
            ex = ex.with_attr(attr);
        }
        match &err {
            ProvError::BackendFailure { op, .. } => ex.with_op(op.clone()),
            _ => ex,
        }
    }
}

/// Conversion from serde_json::Error to ProvError
impl From<serde_json::Error> for ProvError {
    fn from(err: serde_json::Error) -> Self {
        ProvError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from toml::de::Error to ProvError
impl From<toml::de::Error> for ProvError {
    fn from(err: toml::de::Error) -> Self {
        ProvError::Config {
            message: err.to_string(),
        }
    }
}
