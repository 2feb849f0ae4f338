//! Structural diff between two revisions.
//!
//! Metadata is compared per field over [`COMPARED_FIELDS`] with whole-value
//! equality: a `tags` list with the same members in a different order is a
//! change. Blocks are matched across the two sides by `original_block_id`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::content::DocumentMetadata;
use crate::revision::{BlockRevision, Revision};
use crate::types::DbId;

/// How a block matched by `original_block_id` fared between two revisions.
///
/// Only the block's data decides between `Changed` and `Unchanged`; a
/// moved block with the same data is `Unchanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    /// Only in the newer revision.
    Added,
    /// Only in the older revision.
    Removed,
    /// In both, data differs.
    Changed,
    Unchanged,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata fields included in a revision comparison.
pub const COMPARED_FIELDS: &[&str] = &[
    "title",
    "description",
    "status",
    "featured",
    "category",
    "tags",
];

/// One metadata field whose value differs between the two revisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub old: Value,
    pub new: Value,
}

/// A block present on both sides whose data differs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifiedBlock {
    pub original_block_id: DbId,
    pub old: BlockRevision,
    pub new: BlockRevision,
}

/// A block present on both sides with identical data but a new position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReorderedBlock {
    pub original_block_id: DbId,
    pub old_order: i32,
    pub new_order: i32,
}

/// Block-level differences.
///
/// `reordered` is reported separately so that `modified` only ever means
/// "the data changed".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockChanges {
    pub added: Vec<BlockRevision>,
    pub removed: Vec<BlockRevision>,
    pub modified: Vec<ModifiedBlock>,
    pub reordered: Vec<ReorderedBlock>,
}

/// All differences between two revisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RevisionChanges {
    pub metadata: Vec<FieldChange>,
    pub blocks: BlockChanges,
}

impl RevisionChanges {
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
            && self.blocks.added.is_empty()
            && self.blocks.removed.is_empty()
            && self.blocks.modified.is_empty()
            && self.blocks.reordered.is_empty()
    }
}

/// Both revisions as loaded plus the changes leading from the first to the second.
#[derive(Debug, Clone, Serialize)]
pub struct RevisionComparison {
    pub revision1: Revision,
    pub revision2: Revision,
    pub changes: RevisionChanges,
}

/// Compute the changes from `old` to `new`. Pure.
pub fn compare_revisions(old: &Revision, new: &Revision) -> RevisionChanges {
    RevisionChanges {
        metadata: diff_metadata(&old.metadata, &new.metadata),
        blocks: diff_blocks(&old.blocks, &new.blocks),
    }
}

/// Compare the [`COMPARED_FIELDS`] of two metadata snapshots.
pub fn diff_metadata(old: &DocumentMetadata, new: &DocumentMetadata) -> Vec<FieldChange> {
    COMPARED_FIELDS
        .iter()
        .filter_map(|&field| {
            let old_value = field_value(old, field);
            let new_value = field_value(new, field);
            (old_value != new_value).then_some(FieldChange {
                field,
                old: old_value,
                new: new_value,
            })
        })
        .collect()
}

fn field_value(meta: &DocumentMetadata, field: &str) -> Value {
    match field {
        "title" => json!(meta.title),
        "description" => json!(meta.description),
        "status" => json!(meta.status),
        "featured" => json!(meta.featured),
        "category" => json!(meta.category),
        "tags" => json!(meta.tags),
        _ => Value::Null,
    }
}

/// Classify a block matched by `original_block_id` across two revisions.
///
/// Only `data` participates; a pure position change is `Unchanged`.
pub fn classify_block(old: Option<&BlockRevision>, new: Option<&BlockRevision>) -> Option<DiffStatus> {
    match (old, new) {
        (None, None) => None,
        (None, Some(_)) => Some(DiffStatus::Added),
        (Some(_), None) => Some(DiffStatus::Removed),
        (Some(a), Some(b)) if a.content != b.content => Some(DiffStatus::Changed),
        (Some(_), Some(_)) => Some(DiffStatus::Unchanged),
    }
}

/// Diff two block snapshots keyed by `original_block_id`.
pub fn diff_blocks(old: &[BlockRevision], new: &[BlockRevision]) -> BlockChanges {
    let old_by_id: BTreeMap<DbId, &BlockRevision> =
        old.iter().map(|b| (b.original_block_id, b)).collect();
    let new_by_id: BTreeMap<DbId, &BlockRevision> =
        new.iter().map(|b| (b.original_block_id, b)).collect();

    let mut changes = BlockChanges::default();

    for (id, before) in &old_by_id {
        let after = new_by_id.get(id).copied();
        match classify_block(Some(before), after) {
            Some(DiffStatus::Removed) => changes.removed.push((*before).clone()),
            Some(DiffStatus::Changed) => {
                if let Some(after) = after {
                    changes.modified.push(ModifiedBlock {
                        original_block_id: *id,
                        old: (*before).clone(),
                        new: after.clone(),
                    });
                }
            }
            Some(DiffStatus::Unchanged) => {
                if let Some(after) = after.filter(|a| a.order != before.order) {
                    changes.reordered.push(ReorderedBlock {
                        original_block_id: *id,
                        old_order: before.order,
                        new_order: after.order,
                    });
                }
            }
            _ => {}
        }
    }

    for (id, after) in &new_by_id {
        if !old_by_id.contains_key(id) {
            changes.added.push((*after).clone());
        }
    }

    changes.added.sort_by_key(|b| (b.order, b.original_block_id));
    changes.removed.sort_by_key(|b| (b.order, b.original_block_id));
    changes
        .modified
        .sort_by_key(|m| (m.new.order, m.original_block_id));
    changes
        .reordered
        .sort_by_key(|r| (r.new_order, r.original_block_id));
    changes
}
