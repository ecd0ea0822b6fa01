//! Value-set resolver
//!
//! Computes the multi-valued attribute state that would exist after the
//! directory commits a mutation, so validators can check it before the
//! write happens.
//!
//! ## Resolution order
//!
//! 1. **Shrink**: every removed value is deleted; absent values are ignored.
//! 2. **Grow/replace**: replace discards the working set and takes the new
//!    list; add unions the new values in; delete-all empties the set.
//!
//! The result keeps first-seen order (surviving current values, then new
//! values) and holds no duplicates.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use crate::errors::{ProvError, Result};
use crate::model::entry::Entry;
use crate::mutation::AttrMutation;

/// Ordered, de-duplicated set of attribute values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSet {
    values: Vec<String>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from values, dropping duplicates after their first occurrence
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = ValueSet::new();
        for v in values {
            set.insert(v.into());
        }
        set
    }

    /// Current stored values of `attr`, empty when there is no entry
    pub fn from_entry(entry: Option<&dyn Entry>, attr: &str) -> Self {
        entry
            .map(|e| Self::from_values(e.get_multi(attr)))
            .unwrap_or_default()
    }

    /// Resolve the post-commit set for `mutation` applied to `current`
    pub fn resolve(current: ValueSet, mutation: &AttrMutation) -> ValueSet {
        current.apply(mutation)
    }

    /// Apply `mutation` to this set (shrink, then grow or replace)
    pub fn apply(mut self, mutation: &AttrMutation) -> ValueSet {
        for gone in mutation.removed() {
            self.values.retain(|v| v != gone);
        }

        if mutation.is_deleting() {
            return ValueSet::new();
        }
        if mutation.is_replacing() {
            return ValueSet::from_values(mutation.values().iter().cloned());
        }
        for v in mutation.added() {
            self.insert(v.clone());
        }
        self
    }

    /// Insert unless already present; returns whether it was new
    pub fn insert(&mut self, value: String) -> bool {
        if self.values.contains(&value) {
            return false;
        }
        self.values.push(value);
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<String> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Assert no two values share a projected key
    ///
    /// Values whose projection is `None` are skipped.
    ///
    /// # Errors
    ///
    /// `KeyCollision` naming the shared key and both full values, the
    /// earlier one first.
    pub fn check_unique_by<K, F>(&self, attr: &str, key_fn: F) -> Result<()>
    where
        K: Eq + Hash + Display,
        F: Fn(&str) -> Option<K>,
    {
        let mut seen: HashMap<K, &str> = HashMap::new();
        for value in &self.values {
            let Some(key) = key_fn(value) else {
                continue;
            };
            if let Some(first) = seen.get(&key) {
                return Err(ProvError::KeyCollision {
                    attr: attr.to_string(),
                    key: key.to_string(),
                    first: first.to_string(),
                    second: value.clone(),
                });
            }
            seen.insert(key, value);
        }
        Ok(())
    }
}
