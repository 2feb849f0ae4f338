//! PostgreSQL implementation of the versioning store seam.
//!
//! Each [`StoreTx`] wraps one `sqlx` transaction. `load_document` takes a
//! `FOR UPDATE` lock on the `contents` row, which serializes revision
//! writers per document. The `uq_content_revisions_content_number`
//! constraint backs that up: a duplicate number surfaces as
//! [`CoreError::WriteConflict`] and the engine retries the transaction.
//!
//! Committed reads that span several statements run in a `REPEATABLE READ`
//! read-only transaction, so they never see a half-pruned revision.

use std::collections::HashMap;

use async_trait::async_trait;
use folio_core::content::{Block, Document, DocumentMetadata, NewBlock};
use folio_core::error::CoreError;
use folio_core::revision::{NewRevision, Revision};
use folio_core::types::DbId;
use folio_core::versioning::numbering;
use folio_core::versioning::{RevisionStore, StoreTx};
use sqlx::{Postgres, Transaction};

use crate::models::revision::{BlockRevisionRow, ContentRevisionRow};
use crate::repositories::{BlockRepo, BlockRevisionRepo, ContentRepo, RevisionRepo};
use crate::DbPool;

/// PostgreSQL error code for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Map a failure inside a transaction.
///
/// Unique violations become [`CoreError::WriteConflict`] so the caller can
/// retry; everything else aborts the transaction.
pub fn map_tx_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_err.constraint().unwrap_or("unknown");
            return CoreError::WriteConflict(format!(
                "Duplicate value violates unique constraint: {constraint}"
            ));
        }
    }
    CoreError::Transaction(err.to_string())
}

/// Map a failure on a committed read.
pub fn map_read_error(err: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("Database error: {err}"))
}

/// Attach block rows to their revisions, keeping the revision order.
fn assemble_revisions(
    rows: Vec<ContentRevisionRow>,
    block_rows: Vec<BlockRevisionRow>,
) -> Result<Vec<Revision>, CoreError> {
    let mut by_revision: HashMap<DbId, Vec<BlockRevisionRow>> = HashMap::new();
    for block in block_rows {
        by_revision.entry(block.revision_id).or_default().push(block);
    }
    rows.into_iter()
        .map(|row| {
            let blocks = by_revision.remove(&row.id).unwrap_or_default();
            row.into_revision(blocks)
        })
        .collect()
}

/// [`RevisionStore`] over a Postgres pool.
#[derive(Clone)]
pub struct PgRevisionStore {
    pool: DbPool,
}

impl PgRevisionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Read-only transaction on one snapshot, so a revision row and its block
    /// rows are read as of the same commit even while retention deletes.
    async fn begin_snapshot_read(&self) -> Result<Transaction<'static, Postgres>, CoreError> {
        let mut tx = self.pool.begin().await.map_err(map_read_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(map_read_error)?;
        Ok(tx)
    }
}

#[async_trait]
impl RevisionStore for PgRevisionStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, CoreError> {
        let tx = self.pool.begin().await.map_err(map_tx_error)?;
        Ok(Box::new(PgStoreTx { tx }))
    }

    async fn find_revision(&self, revision_id: DbId) -> Result<Option<Revision>, CoreError> {
        let mut tx = self.begin_snapshot_read().await?;
        let Some(row) = RevisionRepo::find_by_id(&mut *tx, revision_id)
            .await
            .map_err(map_read_error)?
        else {
            return Ok(None);
        };
        let blocks = BlockRevisionRepo::list_by_revision(&mut *tx, row.id)
            .await
            .map_err(map_read_error)?;
        tx.commit().await.map_err(map_read_error)?;
        row.into_revision(blocks).map(Some)
    }

    async fn list_revisions(
        &self,
        content_id: DbId,
        limit: i64,
    ) -> Result<Vec<Revision>, CoreError> {
        let mut tx = self.begin_snapshot_read().await?;
        let rows = RevisionRepo::list_by_content(&mut *tx, content_id, limit)
            .await
            .map_err(map_read_error)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
        let blocks = BlockRevisionRepo::list_by_revisions(&mut *tx, &ids)
            .await
            .map_err(map_read_error)?;
        tx.commit().await.map_err(map_read_error)?;
        assemble_revisions(rows, blocks)
    }

    async fn list_content_ids(&self) -> Result<Vec<DbId>, CoreError> {
        RevisionRepo::list_content_ids(&self.pool)
            .await
            .map_err(map_read_error)
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool)
            .await
            .map_err(map_read_error)
    }
}

/// One open Postgres transaction. Dropping it rolls back.
pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn load_document(&mut self, content_id: DbId) -> Result<Option<Document>, CoreError> {
        let Some(row) = ContentRepo::find_for_update(&mut *self.tx, content_id)
            .await
            .map_err(map_tx_error)?
        else {
            return Ok(None);
        };
        let blocks = BlockRepo::list_by_content(&mut *self.tx, content_id)
            .await
            .map_err(map_tx_error)?;
        row.into_document(blocks).map(Some)
    }

    async fn find_revision(&mut self, revision_id: DbId) -> Result<Option<Revision>, CoreError> {
        let Some(row) = RevisionRepo::find_by_id(&mut *self.tx, revision_id)
            .await
            .map_err(map_tx_error)?
        else {
            return Ok(None);
        };
        let blocks = BlockRevisionRepo::list_by_revision(&mut *self.tx, row.id)
            .await
            .map_err(map_tx_error)?;
        row.into_revision(blocks).map(Some)
    }

    async fn next_revision_number(&mut self, content_id: DbId) -> Result<i32, CoreError> {
        let highest = RevisionRepo::max_revision_number(&mut *self.tx, content_id)
            .await
            .map_err(map_tx_error)?;
        Ok(numbering::next_after((highest > 0).then_some(highest)))
    }

    async fn insert_revision(&mut self, revision: &NewRevision) -> Result<Revision, CoreError> {
        let row = RevisionRepo::create(&mut *self.tx, revision)
            .await
            .map_err(map_tx_error)?;

        let mut blocks = Vec::with_capacity(revision.blocks.len());
        for block in &revision.blocks {
            let block_row = BlockRevisionRepo::create(&mut *self.tx, row.id, block)
                .await
                .map_err(map_tx_error)?;
            blocks.push(block_row);
        }
        row.into_revision(blocks)
    }

    async fn update_metadata(
        &mut self,
        content_id: DbId,
        metadata: &DocumentMetadata,
    ) -> Result<(), CoreError> {
        ContentRepo::update_metadata(&mut *self.tx, content_id, metadata)
            .await
            .map_err(map_tx_error)?
            .ok_or(CoreError::NotFound {
                entity: "Content",
                id: content_id,
            })?;
        Ok(())
    }

    async fn replace_blocks(
        &mut self,
        content_id: DbId,
        blocks: &[NewBlock],
    ) -> Result<Vec<Block>, CoreError> {
        for block in blocks {
            block.content.validate()?;
        }
        let removed = BlockRepo::delete_by_content(&mut *self.tx, content_id)
            .await
            .map_err(map_tx_error)?;
        tracing::debug!(content_id, removed, inserting = blocks.len(), "Replacing blocks");

        let mut fresh = Vec::with_capacity(blocks.len());
        for block in blocks {
            let row = BlockRepo::create(&mut *self.tx, content_id, block)
                .await
                .map_err(map_tx_error)?;
            fresh.push(row.into_block()?);
        }
        Ok(fresh)
    }

    async fn revision_ids_newest_first(
        &mut self,
        content_id: DbId,
    ) -> Result<Vec<DbId>, CoreError> {
        RevisionRepo::ids_newest_first(&mut *self.tx, content_id)
            .await
            .map_err(map_tx_error)
    }

    async fn delete_revisions(&mut self, revision_ids: &[DbId]) -> Result<u64, CoreError> {
        RevisionRepo::delete_by_ids(&mut *self.tx, revision_ids)
            .await
            .map_err(map_tx_error)
    }

    async fn commit(self: Box<Self>) -> Result<(), CoreError> {
        self.tx.commit().await.map_err(map_tx_error)
    }
}
