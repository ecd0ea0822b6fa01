//! Duration-valued attributes
//!
//! Values look like `<n>[ms|s|m|h|d]`; a bare number is seconds.

use std::time::Duration;

use crate::errors::{ProvError, Result};
use crate::model::entry::Entry;

/// Parse a duration attribute value
///
/// # Errors
///
/// `InvalidValue` when the number or unit is not recognised.
pub fn parse_duration(attr: &str, value: &str) -> Result<Duration> {
    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);

    let n: u64 = digits
        .parse()
        .map_err(|_| ProvError::invalid_value(attr, value, "expected <n>[ms|s|m|h|d]"))?;

    let millis_per = match unit.to_ascii_lowercase().as_str() {
        "ms" => 1,
        "" | "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        other => {
            return Err(ProvError::invalid_value(
                attr,
                value,
                format!("unknown duration unit '{}'", other),
            ))
        }
    };
    n.checked_mul(millis_per)
        .map(Duration::from_millis)
        .ok_or_else(|| ProvError::invalid_value(attr, value, "duration out of range"))
}

/// Read a duration attribute, using `default` when unset or unparsable
pub fn entry_interval(entry: &dyn Entry, attr: &str, default: &str) -> Duration {
    entry
        .get_single(attr)
        .and_then(|v| parse_duration(attr, &v).ok())
        .or_else(|| parse_duration(attr, default).ok())
        .unwrap_or_default()
}
