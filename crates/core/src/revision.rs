//! Immutable revision snapshots of a document.
//!
//! A [`Revision`] copies every [`DocumentMetadata`] field and owns one
//! [`BlockRevision`] per block present at capture time. Rows are never
//! updated after insert.

use serde::{Deserialize, Serialize};

use crate::block::BlockContent;
use crate::content::DocumentMetadata;
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Why a revision was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionChangeType {
    Create,
    Edit,
    Publish,
    Restore,
}

impl RevisionChangeType {
    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Publish => "publish",
            Self::Restore => "restore",
        }
    }
}

impl std::fmt::Display for RevisionChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RevisionChangeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "edit" => Ok(Self::Edit),
            "publish" => Ok(Self::Publish),
            "restore" => Ok(Self::Restore),
            other => Err(CoreError::Validation(format!(
                "Invalid revision change type '{other}'"
            ))),
        }
    }
}

/// Per-block bookkeeping tag inside a revision. Not used by the diff engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockChangeType {
    Modified,
    Added,
    Removed,
}

impl BlockChangeType {
    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modified => "modified",
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

impl std::str::FromStr for BlockChangeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modified" => Ok(Self::Modified),
            "added" => Ok(Self::Added),
            "removed" => Ok(Self::Removed),
            other => Err(CoreError::Validation(format!(
                "Invalid block change type '{other}'"
            ))),
        }
    }
}

/// Snapshot of one block as captured inside a revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRevision {
    pub id: DbId,
    pub revision_id: DbId,
    /// The live block id at capture time. Historical; the block may be gone.
    pub original_block_id: DbId,
    pub order: i32,
    #[serde(flatten)]
    pub content: BlockContent,
    pub change_type: BlockChangeType,
}

/// A numbered, immutable snapshot of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub id: DbId,
    pub content_id: DbId,
    pub revision_number: i32,
    #[serde(flatten)]
    pub metadata: DocumentMetadata,
    pub changes_summary: Option<String>,
    pub change_type: RevisionChangeType,
    pub created_by: String,
    pub created_at: Timestamp,
    /// Ordered by `order`.
    pub blocks: Vec<BlockRevision>,
}

/// A block snapshot about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBlockRevision {
    pub original_block_id: DbId,
    pub order: i32,
    pub content: BlockContent,
    pub change_type: BlockChangeType,
}

/// A revision about to be written. The store assigns ids and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRevision {
    pub content_id: DbId,
    pub revision_number: i32,
    pub metadata: DocumentMetadata,
    pub changes_summary: Option<String>,
    pub change_type: RevisionChangeType,
    pub created_by: String,
    pub blocks: Vec<NewBlockRevision>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_type_round_trips_through_str() {
        for ct in [
            RevisionChangeType::Create,
            RevisionChangeType::Edit,
            RevisionChangeType::Publish,
            RevisionChangeType::Restore,
        ] {
            assert_eq!(ct.as_str().parse::<RevisionChangeType>().unwrap(), ct);
        }
        assert!("merge".parse::<RevisionChangeType>().is_err());
    }

    #[test]
    fn block_change_type_parses() {
        assert_eq!(
            "added".parse::<BlockChangeType>().unwrap(),
            BlockChangeType::Added
        );
        assert_eq!(BlockChangeType::Removed.as_str(), "removed");
        assert!("moved".parse::<BlockChangeType>().is_err());
    }

    #[test]
    fn change_type_serializes_snake_case() {
        let json = serde_json::to_string(&RevisionChangeType::Restore).unwrap();
        assert_eq!(json, "\"restore\"");
    }
}
