//! Repository for the `content_blocks` table.

use folio_core::content::NewBlock;
use folio_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::content::ContentBlockRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, content_id, block_type, data, block_order, created_at, updated_at";

/// Provides operations on the blocks of a live document.
pub struct BlockRepo;

impl BlockRepo {
    /// Insert one block. The database assigns a fresh id.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        content_id: DbId,
        block: &NewBlock,
    ) -> Result<ContentBlockRow, sqlx::Error> {
        let (block_type, data) = block.content.clone().into_parts();
        let query = format!(
            "INSERT INTO content_blocks (content_id, block_type, data, block_order)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentBlockRow>(&query)
            .bind(content_id)
            .bind(block_type)
            .bind(data)
            .bind(block.order)
            .fetch_one(executor)
            .await
    }

    /// All blocks of a document in render order.
    pub async fn list_by_content<'e>(
        executor: impl PgExecutor<'e>,
        content_id: DbId,
    ) -> Result<Vec<ContentBlockRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_blocks
             WHERE content_id = $1
             ORDER BY block_order ASC, id ASC"
        );
        sqlx::query_as::<_, ContentBlockRow>(&query)
            .bind(content_id)
            .fetch_all(executor)
            .await
    }

    /// Remove every block of a document. Returns the number removed.
    pub async fn delete_by_content<'e>(
        executor: impl PgExecutor<'e>,
        content_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM content_blocks WHERE content_id = $1")
            .bind(content_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
