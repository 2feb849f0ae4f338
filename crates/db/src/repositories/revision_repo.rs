//! Repository for the `content_revisions` table.
//!
//! Revisions are immutable: there is no update. Rows are created by the
//! versioning engine and removed only by retention.

use folio_core::revision::NewRevision;
use folio_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::revision::ContentRevisionRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, content_id, revision_number, title, description, content_type, \
    author, tags, category, featured, image_url, status, slug, changes_summary, \
    change_type, created_by, created_at";

/// Provides append, read and prune operations for content revisions.
pub struct RevisionRepo;

impl RevisionRepo {
    /// Insert the revision row. Block snapshots are inserted separately.
    ///
    /// A duplicate `(content_id, revision_number)` fails with a unique
    /// violation on `uq_content_revisions_content_number`.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &NewRevision,
    ) -> Result<ContentRevisionRow, sqlx::Error> {
        let metadata = &input.metadata;
        let query = format!(
            "INSERT INTO content_revisions
                (content_id, revision_number, title, description, content_type, author, tags,
                 category, featured, image_url, status, slug, changes_summary, change_type, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentRevisionRow>(&query)
            .bind(input.content_id)
            .bind(input.revision_number)
            .bind(&metadata.title)
            .bind(&metadata.description)
            .bind(&metadata.content_type)
            .bind(&metadata.author)
            .bind(&metadata.tags)
            .bind(&metadata.category)
            .bind(metadata.featured)
            .bind(&metadata.image_url)
            .bind(metadata.status.as_str())
            .bind(&metadata.slug)
            .bind(&input.changes_summary)
            .bind(input.change_type.as_str())
            .bind(&input.created_by)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<ContentRevisionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM content_revisions WHERE id = $1");
        sqlx::query_as::<_, ContentRevisionRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Revisions of a document, newest first, at most `limit`.
    pub async fn list_by_content<'e>(
        executor: impl PgExecutor<'e>,
        content_id: DbId,
        limit: i64,
    ) -> Result<Vec<ContentRevisionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_revisions
             WHERE content_id = $1
             ORDER BY revision_number DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, ContentRevisionRow>(&query)
            .bind(content_id)
            .bind(limit)
            .fetch_all(executor)
            .await
    }

    /// Highest revision number of a document (0 if none exist).
    pub async fn max_revision_number<'e>(
        executor: impl PgExecutor<'e>,
        content_id: DbId,
    ) -> Result<i32, sqlx::Error> {
        let result: (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(revision_number), 0) FROM content_revisions WHERE content_id = $1",
        )
        .bind(content_id)
        .fetch_one(executor)
        .await?;
        Ok(result.0)
    }

    /// Revision ids of a document ordered by revision number, highest first.
    pub async fn ids_newest_first<'e>(
        executor: impl PgExecutor<'e>,
        content_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT id FROM content_revisions
             WHERE content_id = $1
             ORDER BY revision_number DESC",
        )
        .bind(content_id)
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Every document id with at least one revision.
    pub async fn list_content_ids<'e>(
        executor: impl PgExecutor<'e>,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT DISTINCT content_id FROM content_revisions ORDER BY content_id",
        )
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Delete revisions by id. Block snapshots go with them via cascade.
    pub async fn delete_by_ids<'e>(
        executor: impl PgExecutor<'e>,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM content_revisions WHERE id = ANY($1)")
            .bind(ids)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
