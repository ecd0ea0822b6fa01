//! provgate core - attribute modification middleware for a directory-backed
//! provisioning layer
//!
//! This crate sits between "caller proposes attribute changes" and "directory
//! commits them". It provides:
//! - Delta batch normalization and the per-attribute mutation view
//! - The value-set resolver for multi-valued attributes
//! - A catalogue-driven validator registry and the two-phase orchestrator
//!   (`apply` before commit, `notify` after it)
//! - The shipped validator library and post-commit side effects
//!
//! The directory client, the persisted write and the maintenance-task
//! runtimes are collaborators injected through traits.

pub mod attrs;
pub mod catalogue;
pub mod config;
pub mod context;
pub mod errors;
pub mod interval;
pub mod library;
pub mod logging_facility;
pub mod model;
pub mod mutation;
pub mod orchestrator;
pub mod registry;
pub mod side_effects;
pub mod validators;
pub mod value_set;

pub use provgate_core_types as core_types;

// Re-export commonly used types
pub use catalogue::{AttributeCatalogue, AttributeInfo};
pub use config::GateConfig;
pub use context::{DataKey, OpKind, TransactionContext};
pub use errors::{ExError, ExErrorKind, ProvError, Result};
pub use model::{AttrValue, DeltaBatch, Directory, Entry, EntryKind, MemDirectory, MemEntry};
pub use mutation::AttrMutation;
pub use orchestrator::{Orchestrator, Prepared};
pub use registry::{Validator, ValidatorId, ValidatorRegistry};
pub use value_set::ValueSet;
