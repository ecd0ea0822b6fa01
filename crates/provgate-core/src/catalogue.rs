//! Attribute metadata catalogue
//!
//! Read-only description of every attribute the middleware knows: value
//! type, cardinality, the validator bound to it, IDN classification and
//! lifecycle flags. The catalogue is loaded from TOML; a built-in catalogue
//! covering the shipped validator library is compiled into the crate.
//!
//! `check_value` is the generic per-attribute check the orchestrator runs
//! before handing a change to the bound validator.

use regex_lite::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::context::OpKind;
use crate::errors::{ProvError, Result};
use crate::interval::parse_duration;
use crate::mutation::AttrMutation;
use crate::registry::ValidatorId;

const BUILTIN_CATALOGUE: &str = include_str!("../data/builtin_catalogue.toml");

/// Declared value type with its constraints
#[derive(Debug, Clone)]
pub enum ValueType {
    String { max_length: Option<usize> },
    Integer { min: Option<i64>, max: Option<i64> },
    Long { min: Option<i64>, max: Option<i64> },
    Boolean,
    Duration,
    Email,
    Enum(Vec<String>),
    Regex(Regex),
}

impl ValueType {
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::String { .. } => "string",
            ValueType::Integer { .. } => "integer",
            ValueType::Long { .. } => "long",
            ValueType::Boolean => "boolean",
            ValueType::Duration => "duration",
            ValueType::Email => "email",
            ValueType::Enum(_) => "enum",
            ValueType::Regex(_) => "regex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    Single,
    Multi,
}

/// Internationalized-name classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdnType {
    #[default]
    None,
    /// `local@domain`; only the domain part is encoded
    Email,
    /// The whole value is a domain name
    Domain,
}

/// Metadata for one attribute
#[derive(Debug, Clone)]
pub struct AttributeInfo {
    pub name: String,
    pub value_type: ValueType,
    pub cardinality: Cardinality,
    pub validator: Option<ValidatorId>,
    pub idn: IdnType,
    pub immutable: bool,
    pub deprecated: bool,
    pub default: Option<String>,
}

impl AttributeInfo {
    pub fn is_multi(&self) -> bool {
        self.cardinality == Cardinality::Multi
    }

    /// Check a pending change against the declared type and cardinality
    ///
    /// Removed values are not checked; only values entering the attribute.
    ///
    /// # Errors
    ///
    /// `ImmutableAttribute`, `SingleValued`, `InvalidValue` or
    /// `ValueTooLong`.
    pub fn check_value(&self, mutation: &AttrMutation, op: OpKind) -> Result<()> {
        if !mutation.is_touched() {
            return Ok(());
        }
        if self.immutable && op == OpKind::Modify {
            return Err(ProvError::ImmutableAttribute {
                attr: self.name.clone(),
            });
        }
        if !self.is_multi() && (mutation.uses_prefixed_form() || mutation.values().len() > 1) {
            return Err(ProvError::SingleValued {
                attr: self.name.clone(),
            });
        }
        for value in mutation.incoming() {
            self.check_one(value)?;
        }
        Ok(())
    }

    fn check_one(&self, value: &str) -> Result<()> {
        let attr = self.name.as_str();
        match &self.value_type {
            ValueType::String { max_length } => {
                let length = value.chars().count();
                match max_length {
                    Some(max) if length > *max => Err(ProvError::ValueTooLong {
                        attr: attr.to_string(),
                        length,
                        max: *max as u64,
                    }),
                    _ => Ok(()),
                }
            }
            ValueType::Integer { min, max } => {
                let n: i32 = value
                    .trim()
                    .parse()
                    .map_err(|_| ProvError::invalid_value(attr, value, "not an integer"))?;
                check_range(attr, value, i64::from(n), *min, *max)
            }
            ValueType::Long { min, max } => {
                let n: i64 = value
                    .trim()
                    .parse()
                    .map_err(|_| ProvError::invalid_value(attr, value, "not a long"))?;
                check_range(attr, value, n, *min, *max)
            }
            ValueType::Boolean => {
                if value.eq_ignore_ascii_case("TRUE") || value.eq_ignore_ascii_case("FALSE") {
                    Ok(())
                } else {
                    Err(ProvError::invalid_value(attr, value, "must be TRUE or FALSE"))
                }
            }
            ValueType::Duration => parse_duration(attr, value).map(|_| ()),
            ValueType::Email => check_email(attr, value),
            ValueType::Enum(allowed) => {
                if allowed.iter().any(|a| a == value) {
                    Ok(())
                } else {
                    Err(ProvError::invalid_value(
                        attr,
                        value,
                        format!("must be one of: {}", allowed.join(", ")),
                    ))
                }
            }
            ValueType::Regex(re) => {
                if re.is_match(value) {
                    Ok(())
                } else {
                    Err(ProvError::invalid_value(attr, value, "does not match pattern"))
                }
            }
        }
    }
}

fn check_range(attr: &str, raw: &str, n: i64, min: Option<i64>, max: Option<i64>) -> Result<()> {
    if let Some(min) = min {
        if n < min {
            return Err(ProvError::invalid_value(attr, raw, format!("must be >= {}", min)));
        }
    }
    if let Some(max) = max {
        if n > max {
            return Err(ProvError::invalid_value(attr, raw, format!("must be <= {}", max)));
        }
    }
    Ok(())
}

/// `local@domain`; an empty local part is a catch-all address
fn check_email(attr: &str, value: &str) -> Result<()> {
    let Some((local, domain)) = value.split_once('@') else {
        return Err(ProvError::invalid_value(attr, value, "missing @"));
    };
    if local.chars().any(char::is_whitespace) {
        return Err(ProvError::invalid_value(attr, value, "whitespace in local part"));
    }
    let host_ok = !domain.is_empty()
        && !domain.starts_with(['.', '-'])
        && !domain.ends_with(['.', '-'])
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if host_ok {
        Ok(())
    } else {
        Err(ProvError::invalid_value(attr, value, "invalid domain part"))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TypeTag {
    String,
    Integer,
    Long,
    Boolean,
    Duration,
    Email,
    Enum,
    Regex,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAttribute {
    name: String,
    #[serde(rename = "type")]
    type_tag: TypeTag,
    #[serde(default)]
    cardinality: Cardinality,
    min: Option<i64>,
    max: Option<i64>,
    max_length: Option<usize>,
    values: Option<Vec<String>>,
    pattern: Option<String>,
    validator: Option<String>,
    #[serde(default)]
    idn: IdnType,
    #[serde(default)]
    immutable: bool,
    #[serde(default)]
    deprecated: bool,
    default: Option<String>,
}

#[derive(Deserialize)]
struct RawCatalogue {
    #[serde(default)]
    attribute: Vec<RawAttribute>,
}

impl TryFrom<RawAttribute> for AttributeInfo {
    type Error = ProvError;

    fn try_from(raw: RawAttribute) -> Result<Self> {
        let config_err = |message: String| ProvError::Config { message };
        let value_type = match raw.type_tag {
            TypeTag::String => ValueType::String {
                max_length: raw.max_length,
            },
            TypeTag::Integer => ValueType::Integer {
                min: raw.min,
                max: raw.max,
            },
            TypeTag::Long => ValueType::Long {
                min: raw.min,
                max: raw.max,
            },
            TypeTag::Boolean => ValueType::Boolean,
            TypeTag::Duration => ValueType::Duration,
            TypeTag::Email => ValueType::Email,
            TypeTag::Enum => match raw.values {
                Some(values) if !values.is_empty() => ValueType::Enum(values),
                _ => {
                    return Err(config_err(format!(
                        "enum attribute {} declares no values",
                        raw.name
                    )))
                }
            },
            TypeTag::Regex => {
                let pattern = raw.pattern.ok_or_else(|| {
                    config_err(format!("regex attribute {} declares no pattern", raw.name))
                })?;
                let re = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                    config_err(format!("bad pattern for {}: {}", raw.name, e))
                })?;
                ValueType::Regex(re)
            }
        };

        Ok(AttributeInfo {
            name: raw.name,
            value_type,
            cardinality: raw.cardinality,
            validator: raw.validator.map(ValidatorId::from),
            idn: raw.idn,
            immutable: raw.immutable,
            deprecated: raw.deprecated,
            default: raw.default,
        })
    }
}

/// Name-indexed attribute metadata, in declaration order
#[derive(Debug, Clone, Default)]
pub struct AttributeCatalogue {
    attrs: Vec<AttributeInfo>,
    index: HashMap<String, usize>,
}

impl AttributeCatalogue {
    /// The catalogue covering the shipped validator library
    ///
    /// # Errors
    ///
    /// Only if the embedded catalogue is malformed.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOGUE)
    }

    /// Parse a catalogue of `[[attribute]]` tables
    ///
    /// # Errors
    ///
    /// `Config` on TOML errors, unknown fields, bad patterns or duplicate
    /// attribute names.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let raw: RawCatalogue = toml::from_str(toml_str)?;
        let mut catalogue = AttributeCatalogue::default();
        for attr in raw.attribute {
            catalogue.insert(AttributeInfo::try_from(attr)?)?;
        }
        Ok(catalogue)
    }

    /// Load a catalogue file
    ///
    /// # Errors
    ///
    /// `Config` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ProvError::Config {
            message: format!("cannot read catalogue {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }

    /// Add an attribute
    ///
    /// # Errors
    ///
    /// `Config` if the name (case-insensitively) is already present.
    pub fn insert(&mut self, info: AttributeInfo) -> Result<()> {
        let key = info.name.to_ascii_lowercase();
        if self.index.contains_key(&key) {
            return Err(ProvError::Config {
                message: format!("duplicate attribute {} in catalogue", info.name),
            });
        }
        self.index.insert(key, self.attrs.len());
        self.attrs.push(info);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AttributeInfo> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&i| &self.attrs[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeInfo> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Declared default value, used when an entry has none of its own
    pub fn default_value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|a| a.default.as_deref())
    }
}
