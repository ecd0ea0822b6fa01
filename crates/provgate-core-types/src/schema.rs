//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_TXN_ID: &str = "txn_id";

// Modification context
pub const FIELD_ATTR: &str = "attr";
pub const FIELD_VALIDATOR: &str = "validator";
pub const FIELD_ENTRY_ID: &str = "entry_id";
pub const FIELD_ENTRY_KIND: &str = "entry_kind";
pub const FIELD_OP_KIND: &str = "op_kind";

// Collection sizes
pub const FIELD_ATTR_COUNT: &str = "attr_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_SIDE_EFFECT_FAILED: &str = "side_effect_failed";
