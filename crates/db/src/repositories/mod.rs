//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! any `PgExecutor` as the first argument, so the same query runs against
//! the pool or inside an open transaction.

pub mod block_repo;
pub mod block_revision_repo;
pub mod content_repo;
pub mod revision_repo;

pub use block_repo::BlockRepo;
pub use block_revision_repo::BlockRevisionRepo;
pub use content_repo::ContentRepo;
pub use revision_repo::RevisionRepo;
