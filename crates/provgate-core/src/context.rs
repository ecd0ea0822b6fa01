//! Per-transaction scratch state
//!
//! One `TransactionContext` is created for each apply/notify pair and is
//! owned by the caller in between. It is never shared across concurrent
//! operations.

use std::collections::{HashMap, HashSet};

use provgate_core_types::TxnId;

use crate::registry::ValidatorId;

/// Whether the transaction creates a new entry or modifies an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Create,
    Modify,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Create => "create",
            OpKind::Modify => "modify",
        }
    }
}

/// Closed set of keys for data passed between phases or seeded by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKey {
    /// Caller override for the signature length limit
    MaxSignatureLength,
    /// Account status before the change, captured in phase 1
    PreviousAccountStatus,
}

/// Scratch state for one modification transaction
#[derive(Debug, Clone)]
pub struct TransactionContext {
    op_kind: OpKind,
    creating_name: Option<String>,
    done: HashSet<ValidatorId>,
    data: HashMap<DataKey, String>,
    txn_id: TxnId,
}

impl TransactionContext {
    pub fn new(op_kind: OpKind) -> Self {
        Self {
            op_kind,
            creating_name: None,
            done: HashSet::new(),
            data: HashMap::new(),
            txn_id: TxnId::new(),
        }
    }

    /// Context for creating an entry whose name is already known
    pub fn for_create(name: impl Into<String>) -> Self {
        Self::new(OpKind::Create).with_creating_name(name)
    }

    pub fn with_creating_name(mut self, name: impl Into<String>) -> Self {
        self.creating_name = Some(name.into());
        self
    }

    /// Pre-load a data bag value (e.g. a caller-supplied limit override)
    pub fn with_data(mut self, key: DataKey, value: impl Into<String>) -> Self {
        self.data.insert(key, value.into());
        self
    }

    /// Reuse the caller's correlation id instead of minting one
    pub fn with_txn_id(mut self, txn_id: TxnId) -> Self {
        self.txn_id = txn_id;
        self
    }

    pub fn op_kind(&self) -> OpKind {
        self.op_kind
    }

    pub fn is_create(&self) -> bool {
        self.op_kind == OpKind::Create
    }

    pub fn creating_name(&self) -> Option<&str> {
        self.creating_name.as_deref()
    }

    pub fn txn_id(&self) -> &TxnId {
        &self.txn_id
    }

    /// Has this validator already run its guarded body?
    pub fn is_done(&self, id: &ValidatorId) -> bool {
        self.done.contains(id)
    }

    /// Record the validator as done; returns false if it already was
    pub fn mark_done(&mut self, id: ValidatorId) -> bool {
        self.done.insert(id)
    }

    pub fn data(&self, key: DataKey) -> Option<&str> {
        self.data.get(&key).map(String::as_str)
    }

    pub fn set_data(&mut self, key: DataKey, value: impl Into<String>) {
        self.data.insert(key, value.into());
    }

    pub fn take_data(&mut self, key: DataKey) -> Option<String> {
        self.data.remove(&key)
    }
}
