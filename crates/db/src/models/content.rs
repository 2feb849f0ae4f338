//! Live document rows: `contents` and `content_blocks`.

use folio_core::block::BlockContent;
use folio_core::content::{Block, Document, DocumentMetadata};
use folio_core::error::CoreError;
use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `contents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentRow {
    pub id: DbId,
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
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ContentRow {
    pub fn metadata(&self) -> Result<DocumentMetadata, CoreError> {
        Ok(DocumentMetadata {
            title: self.title.clone(),
            description: self.description.clone(),
            content_type: self.content_type.clone(),
            author: self.author.clone(),
            tags: self.tags.clone(),
            category: self.category.clone(),
            featured: self.featured,
            image_url: self.image_url.clone(),
            status: self.status.parse()?,
            slug: self.slug.clone(),
        })
    }

    /// Assemble the document with `blocks`, which must belong to this row.
    pub fn into_document(self, blocks: Vec<ContentBlockRow>) -> Result<Document, CoreError> {
        let metadata = self.metadata()?;
        let blocks = blocks
            .into_iter()
            .map(ContentBlockRow::into_block)
            .collect::<Result<Vec<_>, _>>()?;

        let mut document = Document {
            id: self.id,
            metadata,
            version: self.version,
            blocks,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        document.sort_blocks();
        Ok(document)
    }
}

/// A row from the `content_blocks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentBlockRow {
    pub id: DbId,
    pub content_id: DbId,
    pub block_type: String,
    pub data: serde_json::Value,
    pub block_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ContentBlockRow {
    pub fn into_block(self) -> Result<Block, CoreError> {
        Ok(Block {
            id: self.id,
            content_id: self.content_id,
            order: self.block_order,
            content: BlockContent::from_parts(&self.block_type, self.data)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use folio_core::content::ContentStatus;

    fn row(status: &str) -> ContentRow {
        let now = Utc::now();
        ContentRow {
            id: 7,
            title: "Draft".into(),
            description: None,
            content_type: "article".into(),
            author: "ann".into(),
            tags: vec!["rust".into()],
            category: None,
            featured: true,
            image_url: None,
            status: status.into(),
            slug: "draft".into(),
            version: 3,
            created_at: now,
            updated_at: now,
        }
    }

    fn block(id: DbId, order: i32, text: &str) -> ContentBlockRow {
        let now = Utc::now();
        ContentBlockRow {
            id,
            content_id: 7,
            block_type: "paragraph".into(),
            data: json!({ "text": text }),
            block_order: order,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn document_blocks_come_out_in_order() {
        let doc = row("published")
            .into_document(vec![block(2, 1, "second"), block(1, 0, "first")])
            .unwrap();
        assert_eq!(doc.metadata.status, ContentStatus::Published);
        assert_eq!(doc.version, 3);
        assert_eq!(
            doc.blocks.iter().map(|b| b.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(doc.blocks[0].content, BlockContent::paragraph("first"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_matches!(row("deleted").metadata(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn malformed_block_data_is_rejected() {
        let mut bad = block(1, 0, "x");
        bad.data = json!({ "body": 1 });
        assert_matches!(bad.into_block(), Err(CoreError::Validation(_)));
    }
}
