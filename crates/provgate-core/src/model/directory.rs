//! Directory lookups consumed by validators
//!
//! Only the reads the validator library needs are modelled. Backend errors
//! must be reported as `ProvError::BackendFailure`.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{ProvError, Result};
use crate::model::entry::{Entry, EntryKind, MemEntry};

/// Read access to related objects in the directory
pub trait Directory: Send + Sync {
    /// Look up a domain by name (case-insensitive)
    ///
    /// # Errors
    ///
    /// `BackendFailure` when the directory cannot be reached.
    fn domain_by_name(&self, name: &str) -> Result<Option<Arc<dyn Entry>>>;

    /// Look up a class of service by id
    ///
    /// # Errors
    ///
    /// `BackendFailure` when the directory cannot be reached.
    fn cos_by_id(&self, id: &str) -> Result<Option<Arc<dyn Entry>>>;
}

/// In-memory directory, loadable from JSON
#[derive(Debug, Default, Clone)]
pub struct MemDirectory {
    domains: HashMap<String, Arc<MemEntry>>,
    coses: HashMap<String, Arc<MemEntry>>,
}

#[derive(Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    entries: Vec<MemEntry>,
}

impl MemDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: MemEntry) -> Self {
        self.add(domain);
        self
    }

    pub fn with_cos(mut self, cos: MemEntry) -> Self {
        self.add(cos);
        self
    }

    /// Index an entry by kind; kinds without a lookup are ignored
    pub fn add(&mut self, entry: MemEntry) {
        match entry.kind() {
            EntryKind::Domain => {
                self.domains
                    .insert(entry.name().to_ascii_lowercase(), Arc::new(entry));
            }
            EntryKind::Cos => {
                self.coses.insert(entry.id().to_string(), Arc::new(entry));
            }
            _ => {}
        }
    }

    /// Parse `{"entries": [...]}`
    ///
    /// # Errors
    ///
    /// `Serialization` on malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: DirectoryFile = serde_json::from_str(json)?;
        let mut dir = MemDirectory::new();
        for entry in file.entries {
            dir.add(entry);
        }
        Ok(dir)
    }
}

impl Directory for MemDirectory {
    fn domain_by_name(&self, name: &str) -> Result<Option<Arc<dyn Entry>>> {
        Ok(self
            .domains
            .get(&name.to_ascii_lowercase())
            .map(|e| e.clone() as Arc<dyn Entry>))
    }

    fn cos_by_id(&self, id: &str) -> Result<Option<Arc<dyn Entry>>> {
        Ok(self.coses.get(id).map(|e| e.clone() as Arc<dyn Entry>))
    }
}

/// Directory whose backend is always down
#[derive(Debug, Default, Clone, Copy)]
pub struct UnreachableDirectory;

impl Directory for UnreachableDirectory {
    fn domain_by_name(&self, _name: &str) -> Result<Option<Arc<dyn Entry>>> {
        Err(ProvError::BackendFailure {
            op: "domain_by_name".to_string(),
            message: "directory unreachable".to_string(),
        })
    }

    fn cos_by_id(&self, _id: &str) -> Result<Option<Arc<dyn Entry>>> {
        Err(ProvError::BackendFailure {
            op: "cos_by_id".to_string(),
            message: "directory unreachable".to_string(),
        })
    }
}
