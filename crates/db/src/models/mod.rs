//! Row types for the versioning tables.
//!
//! Rows hold columns exactly as stored. The `into_*` conversions parse the
//! text-encoded enums and the `block_type`/`data` pair into core models.

pub mod content;
pub mod revision;
