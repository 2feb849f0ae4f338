//! Live document model: a mutable document and its ordered blocks.

use serde::{Deserialize, Serialize};

use crate::block::BlockContent;
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Publication state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(CoreError::Validation(format!(
                "Invalid content status '{other}'"
            ))),
        }
    }
}

/// Every document field a revision captures.
///
/// Shared by [`Document`] and [`crate::revision::Revision`] so a snapshot
/// is a plain copy and a restore is a plain overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub description: Option<String>,
    pub content_type: String,
    pub author: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub featured: bool,
    pub image_url: Option<String>,
    pub status: ContentStatus,
    pub slug: String,
}

/// A single ordered content unit owned by a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: DbId,
    pub content_id: DbId,
    pub order: i32,
    #[serde(flatten)]
    pub content: BlockContent,
}

/// A block about to be written; the store assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBlock {
    pub order: i32,
    pub content: BlockContent,
}

/// The live, editable document together with its blocks in render order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DbId,
    #[serde(flatten)]
    pub metadata: DocumentMetadata,
    /// Incremented on every metadata write.
    pub version: i32,
    pub blocks: Vec<Block>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Document {
    /// Sort blocks by their `order`, breaking ties by id.
    pub fn sort_blocks(&mut self) {
        self.blocks.sort_by_key(|b| (b.order, b.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            ContentStatus::Draft,
            ContentStatus::Published,
            ContentStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<ContentStatus>().unwrap(), status);
        }
        assert!("deleted".parse::<ContentStatus>().is_err());
    }

    #[test]
    fn block_serializes_flat() {
        let block = Block {
            id: 7,
            content_id: 1,
            order: 0,
            content: BlockContent::paragraph("intro"),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["block_type"], "paragraph");
        assert_eq!(json["data"]["text"], "intro");
        assert_eq!(json["order"], 0);
    }

    #[test]
    fn sort_blocks_orders_by_order_then_id() {
        let now = chrono::Utc::now();
        let block = |id, order| Block {
            id,
            content_id: 1,
            order,
            content: BlockContent::Divider {},
        };
        let mut doc = Document {
            id: 1,
            metadata: DocumentMetadata {
                title: "t".into(),
                description: None,
                content_type: "article".into(),
                author: "ann".into(),
                tags: vec![],
                category: None,
                featured: false,
                image_url: None,
                status: ContentStatus::Draft,
                slug: "t".into(),
            },
            version: 1,
            blocks: vec![block(3, 2), block(2, 0), block(1, 2)],
            created_at: now,
            updated_at: now,
        };
        doc.sort_blocks();
        let ids: Vec<_> = doc.blocks.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
