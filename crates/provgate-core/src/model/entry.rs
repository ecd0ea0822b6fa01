//! Entry handles
//!
//! An [`Entry`] is a read-only view of a persisted (or about to be
//! persisted) configuration object. The orchestrator never writes through
//! it. [`MemEntry`] is the in-memory implementation used by the CLI and
//! tests; it also knows how to produce its own post-commit state so a test
//! can play the directory's part between `apply` and `notify`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::Result;
use crate::model::batch::{AttrValue, DeltaBatch};
use crate::mutation::AttrMutation;
use crate::value_set::ValueSet;

/// Kind of configuration object an entry represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Account,
    Domain,
    Cos,
    Server,
    GlobalConfig,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Account => "account",
            EntryKind::Domain => "domain",
            EntryKind::Cos => "cos",
            EntryKind::Server => "server",
            EntryKind::GlobalConfig => "global_config",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only handle to a configuration object
///
/// Attribute names are matched case-insensitively. Values include any
/// inherited defaults the implementation knows about.
pub trait Entry: Send + Sync {
    fn kind(&self) -> EntryKind;

    /// Stable identity (not the display name)
    fn id(&self) -> &str;

    /// Primary name: the address for accounts, the domain name for domains
    fn name(&self) -> &str;

    /// First value of an attribute, if set
    fn get_single(&self, attr: &str) -> Option<String>;

    /// All values of an attribute in stored order
    fn get_multi(&self, attr: &str) -> Vec<String>;

    /// Values set on this entry itself, without inherited defaults
    ///
    /// Implementations that cannot tell the layers apart return everything.
    fn get_own_multi(&self, attr: &str) -> Vec<String> {
        self.get_multi(attr)
    }

    /// All values of an attribute as a set
    fn get_multi_set(&self, attr: &str) -> BTreeSet<String> {
        self.get_multi(attr).into_iter().collect()
    }
}

/// In-memory entry with an own-values layer over an inherited-defaults layer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawEntry")]
pub struct MemEntry {
    kind: EntryKind,
    id: String,
    name: String,
    attrs: BTreeMap<String, Vec<String>>,
    defaults: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct RawEntry {
    kind: EntryKind,
    id: String,
    name: String,
    #[serde(default)]
    attrs: BTreeMap<String, AttrValue>,
    #[serde(default)]
    defaults: BTreeMap<String, AttrValue>,
}

fn fold_layer(layer: BTreeMap<String, AttrValue>) -> BTreeMap<String, Vec<String>> {
    layer
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.as_slice().to_vec()))
        .collect()
}

impl From<RawEntry> for MemEntry {
    fn from(raw: RawEntry) -> Self {
        MemEntry {
            kind: raw.kind,
            id: raw.id,
            name: raw.name,
            attrs: fold_layer(raw.attrs),
            defaults: fold_layer(raw.defaults),
        }
    }
}

impl MemEntry {
    pub fn new(kind: EntryKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            name: name.into(),
            attrs: BTreeMap::new(),
            defaults: BTreeMap::new(),
        }
    }

    /// Builder-style own value
    pub fn with_attr(mut self, attr: &str, value: impl Into<AttrValue>) -> Self {
        self.set_attr(attr, value);
        self
    }

    /// Builder-style inherited default (e.g. from the class of service)
    pub fn with_default(mut self, attr: &str, value: impl Into<AttrValue>) -> Self {
        self.defaults
            .insert(attr.to_ascii_lowercase(), value.into().as_slice().to_vec());
        self
    }

    pub fn set_attr(&mut self, attr: &str, value: impl Into<AttrValue>) {
        let values = value.into().as_slice().to_vec();
        if values.iter().all(String::is_empty) {
            self.attrs.remove(&attr.to_ascii_lowercase());
        } else {
            self.attrs.insert(attr.to_ascii_lowercase(), values);
        }
    }

    /// Own values only, ignoring inherited defaults
    pub fn own_values(&self, attr: &str) -> &[String] {
        self.attrs
            .get(&attr.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// State after the directory commits `batch`
    ///
    /// # Errors
    ///
    /// Fails if the batch carries conflicting forms for one attribute.
    pub fn committed(&self, batch: &DeltaBatch) -> Result<MemEntry> {
        let mut next = self.clone();
        for attr in batch.base_names() {
            let mutation = AttrMutation::from_batch(&attr, batch)?;
            let resolved = ValueSet::from_values(self.own_values(&attr).iter().cloned())
                .apply(&mutation);
            next.set_attr(&attr, AttrValue::Multi(resolved.into_vec()));
        }
        Ok(next)
    }

    fn lookup(&self, attr: &str) -> Option<&Vec<String>> {
        let key = attr.to_ascii_lowercase();
        self.attrs.get(&key).or_else(|| self.defaults.get(&key))
    }
}

impl Entry for MemEntry {
    fn kind(&self) -> EntryKind {
        self.kind
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn get_single(&self, attr: &str) -> Option<String> {
        self.lookup(attr).and_then(|v| v.first().cloned())
    }

    fn get_multi(&self, attr: &str) -> Vec<String> {
        self.lookup(attr).cloned().unwrap_or_default()
    }

    fn get_own_multi(&self, attr: &str) -> Vec<String> {
        self.own_values(attr).to_vec()
    }
}
