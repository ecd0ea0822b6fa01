//! Delta batches: the caller-supplied attribute changes for one transaction
//!
//! A batch maps *mutation keys* to raw values. A mutation key is a base
//! attribute name (replace/set), or the name prefixed with `+` (add values)
//! or `-` (remove values). A `None` value or an empty value under a plain key
//! unsets the attribute.
//!
//! Iteration order is insertion order. That is the only ordering contract
//! validators get.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::errors::{ProvError, Result};

/// Raw value(s) under one mutation key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Single(String),
    Multi(Vec<String>),
}

impl AttrValue {
    /// View the value(s) as a slice
    pub fn as_slice(&self) -> &[String] {
        match self {
            AttrValue::Single(s) => std::slice::from_ref(s),
            AttrValue::Multi(v) => v,
        }
    }

    /// True for `""` and `[]`
    pub fn is_empty(&self) -> bool {
        match self {
            AttrValue::Single(s) => s.is_empty(),
            AttrValue::Multi(v) => v.is_empty(),
        }
    }

    /// Rebuild a value of the same shape from new contents
    ///
    /// A single value stays single when exactly one value remains.
    pub fn reshaped(&self, values: Vec<String>) -> AttrValue {
        match self {
            AttrValue::Single(_) if values.len() == 1 => {
                AttrValue::Single(values.into_iter().next().unwrap_or_default())
            }
            _ => AttrValue::Multi(values),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Single(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Single(s)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::Multi(v)
    }
}

impl From<Vec<&str>> for AttrValue {
    fn from(v: Vec<&str>) -> Self {
        AttrValue::Multi(v.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for AttrValue {
    fn from(v: [&str; N]) -> Self {
        AttrValue::Multi(v.iter().map(|s| s.to_string()).collect())
    }
}

/// How a mutation key acts on its base attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyForm {
    /// Plain name: replace (or unset when empty)
    Replace,
    /// `+name`: add values
    Add,
    /// `-name`: remove values
    Remove,
}

impl KeyForm {
    pub fn prefix(&self) -> &'static str {
        match self {
            KeyForm::Replace => "",
            KeyForm::Add => "+",
            KeyForm::Remove => "-",
        }
    }
}

/// A mutation key split into base name and form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationKey<'a> {
    pub base: &'a str,
    pub form: KeyForm,
}

impl<'a> MutationKey<'a> {
    pub fn parse(key: &'a str) -> Self {
        if let Some(base) = key.strip_prefix('+') {
            MutationKey {
                base,
                form: KeyForm::Add,
            }
        } else if let Some(base) = key.strip_prefix('-') {
            MutationKey {
                base,
                form: KeyForm::Remove,
            }
        } else {
            MutationKey {
                base: key,
                form: KeyForm::Replace,
            }
        }
    }

    /// Lower-cased base name, used for all attribute comparisons
    pub fn folded_base(&self) -> String {
        self.base.to_ascii_lowercase()
    }
}

/// Strip a `+`/`-` prefix from a changed attribute name
pub fn base_name(key: &str) -> &str {
    MutationKey::parse(key).base
}

/// The caller-supplied set of attribute changes for one transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaBatch {
    entries: Vec<(String, Option<AttrValue>)>,
}

impl DeltaBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    /// Builder-style unset (`key => None`)
    pub fn with_unset(mut self, key: impl Into<String>) -> Self {
        self.insert(key, None);
        self
    }

    /// Insert or overwrite the value under an exact key
    pub fn insert(&mut self, key: impl Into<String>, value: Option<AttrValue>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Value under an exact key (`Some(None)` means present and unset)
    pub fn get(&self, key: &str) -> Option<&Option<AttrValue>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Value under the plain form of `base`, matched case-insensitively
    pub fn get_plain(&self, base: &str) -> Option<&Option<AttrValue>> {
        self.entries
            .iter()
            .find(|(k, _)| {
                let key = MutationKey::parse(k);
                key.form == KeyForm::Replace && key.base.eq_ignore_ascii_case(base)
            })
            .map(|(_, v)| v)
    }

    /// All entries whose base name matches `base` (case-insensitive)
    pub fn entries_for<'a>(
        &'a self,
        base: &'a str,
    ) -> impl Iterator<Item = (KeyForm, &'a str, Option<&'a AttrValue>)> + 'a {
        self.entries.iter().filter_map(move |(k, v)| {
            let key = MutationKey::parse(k);
            key.base
                .eq_ignore_ascii_case(base)
                .then_some((key.form, k.as_str(), v.as_ref()))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&AttrValue>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct base names in first-seen order, prefixes stripped
    pub fn base_names(&self) -> Vec<String> {
        let mut seen = Vec::<String>::new();
        let mut names = Vec::new();
        for (k, _) in &self.entries {
            let key = MutationKey::parse(k);
            let folded = key.folded_base();
            if !seen.contains(&folded) {
                seen.push(folded);
                names.push(key.base.to_string());
            }
        }
        names
    }

    /// Reject empty names and conflicting forms for one base name
    ///
    /// A plain key may not be combined with any other key for the same base
    /// name. `+name` and `-name` may coexist. The same form spelled twice
    /// (`mail` and `MAIL`) also conflicts.
    ///
    /// # Errors
    ///
    /// `EmptyAttributeName` or `ConflictingMutation`.
    pub fn check_forms(&self) -> Result<()> {
        let mut by_base: HashMap<String, Vec<(KeyForm, &str)>> = HashMap::new();
        for (k, _) in &self.entries {
            let key = MutationKey::parse(k);
            if key.base.is_empty() {
                return Err(ProvError::EmptyAttributeName);
            }
            by_base
                .entry(key.folded_base())
                .or_default()
                .push((key.form, k.as_str()));
        }

        for name in self.base_names() {
            let forms = &by_base[&name.to_ascii_lowercase()];
            if forms.len() < 2 {
                continue;
            }
            let has_plain = forms.iter().any(|(f, _)| *f == KeyForm::Replace);
            let repeated = forms
                .iter()
                .enumerate()
                .any(|(i, (f, _))| forms[..i].iter().any(|(g, _)| g == f));
            if has_plain || repeated {
                let spelled: Vec<&str> = forms.iter().map(|(_, k)| *k).collect();
                return Err(ProvError::ConflictingMutation {
                    attr: name,
                    forms: spelled.join(", "),
                });
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for DeltaBatch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut batch = DeltaBatch::new();
        for (k, v) in iter {
            batch.insert(k, Some(v.into()));
        }
        batch
    }
}

impl Serialize for DeltaBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct BatchVisitor;

impl<'de> Visitor<'de> for BatchVisitor {
    type Value = DeltaBatch;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of attribute keys to a string, a list of strings, or null")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<DeltaBatch, A::Error> {
        let mut batch = DeltaBatch::new();
        while let Some((key, value)) = access.next_entry::<String, Option<AttrValue>>()? {
            batch.insert(key, value);
        }
        Ok(batch)
    }
}

impl<'de> Deserialize<'de> for DeltaBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(BatchVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_forms() {
        assert_eq!(MutationKey::parse("+mailAlias").form, KeyForm::Add);
        assert_eq!(MutationKey::parse("-mailAlias").base, "mailAlias");
        assert_eq!(MutationKey::parse("mail").form, KeyForm::Replace);
        assert_eq!(base_name("+x"), "x");
    }

    #[test]
    fn test_add_and_remove_may_coexist() {
        let batch = DeltaBatch::new()
            .with("+domainCosMaxAccounts", ["a:3"])
            .with("-domainCosMaxAccounts", ["a:1"]);
        assert!(batch.check_forms().is_ok());
        assert_eq!(batch.base_names(), vec!["domainCosMaxAccounts".to_string()]);
    }

    #[test]
    fn test_plain_and_prefixed_conflict() {
        let batch = DeltaBatch::new()
            .with("mailAlias", ["a@x.com"])
            .with("+mailAlias", ["b@x.com"]);
        let err = batch.check_forms().unwrap_err();
        assert!(matches!(err, ProvError::ConflictingMutation { ref attr, .. } if attr == "mailAlias"));
    }

    #[test]
    fn test_case_variants_conflict() {
        let batch = DeltaBatch::new().with("mail", "a@x.com").with("MAIL", "b@x.com");
        assert!(matches!(
            batch.check_forms(),
            Err(ProvError::ConflictingMutation { .. })
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let batch = DeltaBatch::new().with("+", "x");
        assert_eq!(batch.check_forms(), Err(ProvError::EmptyAttributeName));
    }

    #[test]
    fn test_json_preserves_order_and_nulls() {
        let batch: DeltaBatch =
            serde_json::from_str(r#"{"zeta": "1", "+alpha": ["a", "b"], "mid": null}"#).unwrap();
        let keys: Vec<&str> = batch.keys().collect();
        assert_eq!(keys, vec!["zeta", "+alpha", "mid"]);
        assert_eq!(batch.get("mid"), Some(&None));
        assert_eq!(
            batch.get("+alpha"),
            Some(&Some(AttrValue::Multi(vec!["a".into(), "b".into()])))
        );
    }

    #[test]
    fn test_reshaped_keeps_single() {
        let v = AttrValue::Single("X".into());
        assert_eq!(v.reshaped(vec!["y".into()]), AttrValue::Single("y".into()));
        assert_eq!(
            v.reshaped(vec![]),
            AttrValue::Multi(vec![]),
            "no values left collapses to an empty list"
        );
    }
}
