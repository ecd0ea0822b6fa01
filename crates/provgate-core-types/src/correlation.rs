//! Correlation types for transaction tracking
//!
//! A modification transaction spans two calls (`apply` before the directory
//! commit, `notify` after it). The `TxnId` is minted once per transaction so
//! that log events from both phases can be joined.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one apply/notify transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxnId(String);

impl TxnId {
    /// Generate a new random TxnId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (e.g. an id carried by the caller's request)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for TxnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TxnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
