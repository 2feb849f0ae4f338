//! Revision log rows: `content_revisions` and `content_block_revisions`.
//!
//! Both tables are append-only. Rows are inserted once and only ever
//! removed by retention.

use folio_core::block::BlockContent;
use folio_core::content::DocumentMetadata;
use folio_core::error::CoreError;
use folio_core::revision::{BlockRevision, Revision};
use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `content_revisions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentRevisionRow {
    pub id: DbId,
    pub content_id: DbId,
    pub revision_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub content_type: String,
    pub author: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub featured: bool,
    pub image_url: Option<String>,
    pub status: String,
    pub slug: String,
    pub changes_summary: Option<String>,
    pub change_type: String,
    pub created_by: String,
    pub created_at: Timestamp,
}

impl ContentRevisionRow {
    /// Assemble the revision with its block snapshots.
    ///
    /// Block rows for other revisions are an error; the caller groups them.
    pub fn into_revision(self, blocks: Vec<BlockRevisionRow>) -> Result<Revision, CoreError> {
        let mut snapshots = Vec::with_capacity(blocks.len());
        for block in blocks {
            if block.revision_id != self.id {
                return Err(CoreError::Internal(format!(
                    "Block snapshot {} belongs to revision {}, not {}",
                    block.id, block.revision_id, self.id
                )));
            }
            snapshots.push(block.into_block_revision()?);
        }
        snapshots.sort_by_key(|b| (b.order, b.id));

        Ok(Revision {
            id: self.id,
            content_id: self.content_id,
            revision_number: self.revision_number,
            metadata: DocumentMetadata {
                title: self.title,
                description: self.description,
                content_type: self.content_type,
                author: self.author,
                tags: self.tags,
                category: self.category,
                featured: self.featured,
                image_url: self.image_url,
                status: self.status.parse()?,
                slug: self.slug,
            },
            changes_summary: self.changes_summary,
            change_type: self.change_type.parse()?,
            created_by: self.created_by,
            created_at: self.created_at,
            blocks: snapshots,
        })
    }
}

/// A row from the `content_block_revisions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BlockRevisionRow {
    pub id: DbId,
    pub revision_id: DbId,
    pub original_block_id: DbId,
    pub block_type: String,
    pub data: serde_json::Value,
    pub block_order: i32,
    pub change_type: String,
    pub created_at: Timestamp,
}

impl BlockRevisionRow {
    pub fn into_block_revision(self) -> Result<BlockRevision, CoreError> {
        Ok(BlockRevision {
            id: self.id,
            revision_id: self.revision_id,
            original_block_id: self.original_block_id,
            order: self.block_order,
            content: BlockContent::from_parts(&self.block_type, self.data)?,
            change_type: self.change_type.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use folio_core::revision::{BlockChangeType, RevisionChangeType};

    fn revision_row() -> ContentRevisionRow {
        ContentRevisionRow {
            id: 10,
            content_id: 1,
            revision_number: 4,
            title: "Final".into(),
            description: Some("d".into()),
            content_type: "article".into(),
            author: "ann".into(),
            tags: vec![],
            category: None,
            featured: false,
            image_url: None,
            status: "draft".into(),
            slug: "final".into(),
            changes_summary: None,
            change_type: "restore".into(),
            created_by: "ann".into(),
            created_at: Utc::now(),
        }
    }

    fn block_row(id: DbId, revision_id: DbId, order: i32) -> BlockRevisionRow {
        BlockRevisionRow {
            id,
            revision_id,
            original_block_id: id + 100,
            block_type: "heading".into(),
            data: json!({ "text": "H", "level": 2 }),
            block_order: order,
            change_type: "modified".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn assembles_revision_with_ordered_blocks() {
        let revision = revision_row()
            .into_revision(vec![block_row(2, 10, 1), block_row(1, 10, 0)])
            .unwrap();
        assert_eq!(revision.change_type, RevisionChangeType::Restore);
        assert_eq!(revision.metadata.title, "Final");
        assert_eq!(revision.blocks[0].id, 1);
        assert_eq!(revision.blocks[0].original_block_id, 101);
        assert_eq!(revision.blocks[1].change_type, BlockChangeType::Modified);
        assert_eq!(revision.blocks[1].content, BlockContent::heading("H", 2));
    }

    #[test]
    fn foreign_block_rows_are_rejected() {
        let result = revision_row().into_revision(vec![block_row(1, 99, 0)]);
        assert_matches!(result, Err(CoreError::Internal(_)));
    }
}
