//! Persistence seam for the versioning engine.
//!
//! The engine never talks to a database directly. It asks a
//! [`RevisionStore`] for committed reads and opens a [`StoreTx`] for every
//! write path. A transaction that is dropped without [`StoreTx::commit`]
//! rolls back, so an early `?` return can never leave partial state.

use async_trait::async_trait;

use crate::content::{Block, Document, DocumentMetadata, NewBlock};
use crate::error::CoreError;
use crate::revision::{NewRevision, Revision};
use crate::types::DbId;

/// Committed reads plus the entry point for transactional writes.
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Open a new atomic unit of work.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, CoreError>;

    /// Load a committed revision with its block snapshots.
    async fn find_revision(&self, revision_id: DbId) -> Result<Option<Revision>, CoreError>;

    /// Committed revisions for a document, newest first, at most `limit`.
    async fn list_revisions(
        &self,
        content_id: DbId,
        limit: i64,
    ) -> Result<Vec<Revision>, CoreError>;

    /// Ids of every document that has at least one revision.
    async fn list_content_ids(&self) -> Result<Vec<DbId>, CoreError>;

    /// Cheap liveness probe for the backing store.
    async fn health_check(&self) -> Result<(), CoreError>;
}

/// One open transaction against the store.
#[async_trait]
pub trait StoreTx: Send {
    /// Load a document with its blocks in `order` and hold its write lock
    /// until the transaction ends. Returns `None` if the document is gone.
    async fn load_document(&mut self, content_id: DbId) -> Result<Option<Document>, CoreError>;

    /// Load a revision with its block snapshots.
    async fn find_revision(&mut self, revision_id: DbId) -> Result<Option<Revision>, CoreError>;

    /// Highest existing revision number for the document plus one, or 1.
    async fn next_revision_number(&mut self, content_id: DbId) -> Result<i32, CoreError>;

    /// Append a revision and its block snapshots.
    ///
    /// A duplicate `(content_id, revision_number)` is reported as
    /// [`CoreError::WriteConflict`].
    async fn insert_revision(&mut self, revision: &NewRevision) -> Result<Revision, CoreError>;

    /// Overwrite the tracked metadata fields, bump `version` and `updated_at`.
    async fn update_metadata(
        &mut self,
        content_id: DbId,
        metadata: &DocumentMetadata,
    ) -> Result<(), CoreError>;

    /// Delete every block of the document and insert `blocks` with fresh ids.
    /// Blocks failing [`crate::block::BlockContent::validate`] are rejected.
    async fn replace_blocks(
        &mut self,
        content_id: DbId,
        blocks: &[NewBlock],
    ) -> Result<Vec<Block>, CoreError>;

    /// Revision ids for the document ordered by revision number, highest first.
    async fn revision_ids_newest_first(&mut self, content_id: DbId)
        -> Result<Vec<DbId>, CoreError>;

    /// Delete revisions (and their block snapshots). Returns rows removed.
    async fn delete_revisions(&mut self, revision_ids: &[DbId]) -> Result<u64, CoreError>;

    /// Make every write in this transaction visible at once.
    async fn commit(self: Box<Self>) -> Result<(), CoreError>;
}
