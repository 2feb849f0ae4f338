//! Domain core for the content versioning backend.
//!
//! Holds the document/block/revision model, the diff engine and the
//! versioning engine. The engine talks to persistence only through the
//! [`versioning::RevisionStore`] seam, so it has no dependency on a
//! particular database.

pub mod block;
pub mod content;
pub mod diff;
pub mod error;
pub mod revision;
pub mod types;
pub mod versioning;
