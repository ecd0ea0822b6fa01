//! IDNA canonicalization of internationalizable attributes
//!
//! Values entering an email or domain attribute are rewritten to their
//! ASCII-compatible form before anything else looks at them. For email
//! values only the domain part is encoded; a leading `@` (catch-all) is
//! kept as is. Values that encode identically collapse to one. Removals
//! are left untouched so they still match what the directory stores.

use url::Host;

use crate::catalogue::IdnType;
use crate::errors::{ProvError, Result};
use crate::model::batch::{DeltaBatch, KeyForm};

/// Rewrite the plain and `+` forms of `attr` in `batch`
///
/// Returns `None` when nothing changed.
///
/// # Errors
///
/// `Canonicalization` when a domain cannot be encoded.
pub fn canonicalize(attr: &str, idn: IdnType, batch: &DeltaBatch) -> Result<Option<DeltaBatch>> {
    if idn == IdnType::None {
        return Ok(None);
    }

    let mut rewritten = batch.clone();
    let mut changed = false;
    for (form, key, value) in batch.entries_for(attr) {
        if form == KeyForm::Remove {
            continue;
        }
        let Some(value) = value else {
            continue;
        };

        let mut encoded: Vec<String> = Vec::with_capacity(value.as_slice().len());
        for raw in value.as_slice() {
            let v = if raw.is_empty() {
                raw.clone()
            } else {
                canonical_value(attr, idn, raw)?
            };
            if !encoded.contains(&v) {
                encoded.push(v);
            }
        }

        if encoded.as_slice() != value.as_slice() {
            rewritten.insert(key, Some(value.reshaped(encoded)));
            changed = true;
        }
    }
    Ok(changed.then_some(rewritten))
}

/// ASCII-compatible form of one value
///
/// # Errors
///
/// `Canonicalization` when the domain part is not a valid host.
pub fn canonical_value(attr: &str, idn: IdnType, value: &str) -> Result<String> {
    match idn {
        IdnType::None => Ok(value.to_string()),
        IdnType::Domain => encode_host(attr, value, value),
        IdnType::Email => {
            if let Some(domain) = value.strip_prefix('@') {
                return Ok(format!("@{}", encode_host(attr, value, domain)?));
            }
            match value.rsplit_once('@') {
                Some((local, domain)) => Ok(format!("{}@{}", local, encode_host(attr, value, domain)?)),
                // Not an address at all; the catalogue check reports it.
                None => Ok(value.to_string()),
            }
        }
    }
}

fn encode_host(attr: &str, value: &str, host: &str) -> Result<String> {
    Host::parse(host)
        .map(|h| h.to_string())
        .map_err(|e| ProvError::Canonicalization {
            attr: attr.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}
