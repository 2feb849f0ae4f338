//! Content versioning engine.
//!
//! - [`snapshot`]  -- capture a document into an immutable revision
//! - [`numbering`] -- per-document revision numbers and conflict retry
//! - [`restore`]   -- transactional restore to an earlier revision
//! - [`retention`] -- pruning the oldest revisions
//! - [`engine`]    -- the public operations tying them together
//! - [`store`]     -- the persistence seam, with [`memory`] as a reference store

pub mod engine;
pub mod memory;
pub mod numbering;
pub mod restore;
pub mod retention;
pub mod snapshot;
pub mod store;

pub use engine::VersioningEngine;
pub use memory::{FailPoint, InMemoryStore};
pub use numbering::RetryPolicy;
pub use restore::{RestoreOutcome, RestoreStage};
pub use retention::{RetentionSweep, DEFAULT_KEEP_COUNT};
pub use store::{RevisionStore, StoreTx};
