//! Repository for the `contents` table.

use folio_core::content::DocumentMetadata;
use folio_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::content::ContentRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, content_type, author, tags, category, \
    featured, image_url, status, slug, version, created_at, updated_at";

/// Provides CRUD operations for live documents.
pub struct ContentRepo;

impl ContentRepo {
    /// Insert a new document at version 1.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        metadata: &DocumentMetadata,
    ) -> Result<ContentRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO contents
                (title, description, content_type, author, tags, category, featured, image_url, status, slug)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentRow>(&query)
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
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<ContentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM contents WHERE id = $1");
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a document and take its row lock until the surrounding
    /// transaction ends. Serializes revision writers per document.
    pub async fn find_for_update<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<ContentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM contents WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Overwrite every tracked field, bumping `version` and `updated_at`.
    pub async fn update_metadata<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        metadata: &DocumentMetadata,
    ) -> Result<Option<ContentRow>, sqlx::Error> {
        let query = format!(
            "UPDATE contents SET
                title = $2,
                description = $3,
                content_type = $4,
                author = $5,
                tags = $6,
                category = $7,
                featured = $8,
                image_url = $9,
                status = $10,
                slug = $11,
                version = version + 1,
                updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(id)
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
            .fetch_optional(executor)
            .await
    }

    /// Delete a document and its blocks. Revisions are kept.
    pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contents WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
