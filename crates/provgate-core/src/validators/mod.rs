//! Shipped validator library
//!
//! Each validator is bound to its attributes through the catalogue; see
//! [`crate::library::standard_validators`] for the standard wiring.

pub mod address_whitelist;
pub mod canonical;
pub mod cos_reference;
pub mod enumerated;
pub mod keyed_unique;
pub mod layered_length;
pub mod quota;

pub use address_whitelist::AddressWhitelist;
pub use cos_reference::CosReference;
pub use enumerated::EnumeratedWithEscape;
pub use keyed_unique::{KeyedUniqueness, PayloadRule};
pub use layered_length::LayeredLength;
pub use quota::QuotaHierarchy;
