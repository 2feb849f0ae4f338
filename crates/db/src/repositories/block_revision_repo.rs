//! Repository for the `content_block_revisions` table.

use folio_core::revision::NewBlockRevision;
use folio_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::revision::BlockRevisionRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, revision_id, original_block_id, block_type, data, block_order, \
    change_type, created_at";

/// Provides insert and read operations for block snapshots.
pub struct BlockRevisionRepo;

impl BlockRevisionRepo {
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        revision_id: DbId,
        input: &NewBlockRevision,
    ) -> Result<BlockRevisionRow, sqlx::Error> {
        let (block_type, data) = input.content.clone().into_parts();
        let query = format!(
            "INSERT INTO content_block_revisions
                (revision_id, original_block_id, block_type, data, block_order, change_type)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BlockRevisionRow>(&query)
            .bind(revision_id)
            .bind(input.original_block_id)
            .bind(block_type)
            .bind(data)
            .bind(input.order)
            .bind(input.change_type.as_str())
            .fetch_one(executor)
            .await
    }

    /// Block snapshots of one revision in order.
    pub async fn list_by_revision<'e>(
        executor: impl PgExecutor<'e>,
        revision_id: DbId,
    ) -> Result<Vec<BlockRevisionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_block_revisions
             WHERE revision_id = $1
             ORDER BY block_order ASC, id ASC"
        );
        sqlx::query_as::<_, BlockRevisionRow>(&query)
            .bind(revision_id)
            .fetch_all(executor)
            .await
    }

    /// Block snapshots of several revisions in one round trip.
    pub async fn list_by_revisions<'e>(
        executor: impl PgExecutor<'e>,
        revision_ids: &[DbId],
    ) -> Result<Vec<BlockRevisionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_block_revisions
             WHERE revision_id = ANY($1)
             ORDER BY revision_id ASC, block_order ASC, id ASC"
        );
        sqlx::query_as::<_, BlockRevisionRow>(&query)
            .bind(revision_ids)
            .fetch_all(executor)
            .await
    }
}
