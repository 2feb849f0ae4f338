//! Restoring a document to an earlier revision.
//!
//! A restore runs as a fixed sequence of [`RestoreStage`]s inside a single
//! store transaction:
//!
//! 1. `LoadTarget`        -- load the target revision, check it belongs to the document
//! 2. `LoadDocument`      -- load and lock the live document
//! 3. `Backup`            -- snapshot the pre-restore state (`edit`)
//! 4. `OverwriteMetadata` -- copy the target's metadata onto the document
//! 5. `ReplaceBlocks`     -- drop all blocks, recreate the target's with fresh ids
//! 6. `RestoreMarker`     -- snapshot the restored state (`restore`)
//!
//! The caller commits only after the last stage succeeds, so a failure at
//! any stage leaves both the document and its revision log untouched.

use serde::Serialize;

use crate::content::{Document, NewBlock};
use crate::error::CoreError;
use crate::revision::{Revision, RevisionChangeType};
use crate::types::DbId;

use super::snapshot;
use super::store::StoreTx;

/// A step of the restore state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStage {
    LoadTarget,
    LoadDocument,
    Backup,
    OverwriteMetadata,
    ReplaceBlocks,
    RestoreMarker,
}

impl RestoreStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadTarget => "load_target",
            Self::LoadDocument => "load_document",
            Self::Backup => "backup",
            Self::OverwriteMetadata => "overwrite_metadata",
            Self::ReplaceBlocks => "replace_blocks",
            Self::RestoreMarker => "restore_marker",
        }
    }
}

impl std::fmt::Display for RestoreStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a committed restore.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreOutcome {
    /// The live document after the restore, blocks in order.
    pub document: Document,
    /// Snapshot of the state that was overwritten.
    pub backup: Revision,
    /// Snapshot of the restored state.
    pub marker: Revision,
}

/// Blocks to recreate from a revision, preserving order and data.
///
/// Each block must still pass [`crate::block::BlockContent::validate`].
pub fn blocks_from_revision(revision: &Revision) -> Result<Vec<NewBlock>, CoreError> {
    let mut blocks = revision
        .blocks
        .iter()
        .map(|b| {
            b.content.validate()?;
            Ok(NewBlock {
                order: b.order,
                content: b.content.clone(),
            })
        })
        .collect::<Result<Vec<NewBlock>, CoreError>>()?;
    blocks.sort_by_key(|b| b.order);
    Ok(blocks)
}

/// `changes_summary` of the backup revision.
pub fn backup_summary(target: &Revision, restored_by: &str) -> String {
    format!(
        "Automatic backup before restoring to revision #{} (requested by {restored_by})",
        target.revision_number
    )
}

/// `changes_summary` of the restore-marker revision.
pub fn marker_summary(target: &Revision, restored_by: &str) -> String {
    format!(
        "Restored to revision #{} from {} by {restored_by}",
        target.revision_number,
        target.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// One restore attempt bound to an open transaction.
pub(crate) struct RestoreRun<'a> {
    tx: &'a mut dyn StoreTx,
    content_id: DbId,
    target_revision_id: DbId,
    restored_by: &'a str,
    stage: RestoreStage,
}

impl<'a> RestoreRun<'a> {
    pub(crate) fn new(
        tx: &'a mut dyn StoreTx,
        content_id: DbId,
        target_revision_id: DbId,
        restored_by: &'a str,
    ) -> Self {
        Self {
            tx,
            content_id,
            target_revision_id,
            restored_by,
            stage: RestoreStage::LoadTarget,
        }
    }

    /// The stage reached so far; on failure, the stage that failed.
    pub(crate) fn stage(&self) -> RestoreStage {
        self.stage
    }

    fn enter(&mut self, stage: RestoreStage) {
        self.stage = stage;
        tracing::trace!(content_id = self.content_id, stage = %stage, "Restore stage");
    }

    pub(crate) async fn execute(&mut self) -> Result<RestoreOutcome, CoreError> {
        let content_id = self.content_id;

        self.enter(RestoreStage::LoadTarget);
        let target = self
            .tx
            .find_revision(self.target_revision_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Revision",
                id: self.target_revision_id,
            })?;
        if target.content_id != content_id {
            return Err(CoreError::ReferenceMismatch {
                revision_id: target.id,
                expected_content_id: content_id,
                actual_content_id: target.content_id,
            });
        }

        self.enter(RestoreStage::LoadDocument);
        let current = self
            .tx
            .load_document(content_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Content",
                id: content_id,
            })?;

        self.enter(RestoreStage::Backup);
        let backup = snapshot::capture(
            &mut *self.tx,
            &current,
            RevisionChangeType::Edit,
            Some(backup_summary(&target, self.restored_by)),
            current.metadata.author.clone(),
        )
        .await?;

        self.enter(RestoreStage::OverwriteMetadata);
        self.tx.update_metadata(content_id, &target.metadata).await?;

        self.enter(RestoreStage::ReplaceBlocks);
        let blocks = blocks_from_revision(&target)?;
        self.tx.replace_blocks(content_id, &blocks).await?;

        self.enter(RestoreStage::RestoreMarker);
        let restored = self
            .tx
            .load_document(content_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Content",
                id: content_id,
            })?;
        let marker = snapshot::capture(
            &mut *self.tx,
            &restored,
            RevisionChangeType::Restore,
            Some(marker_summary(&target, self.restored_by)),
            target.metadata.author.clone(),
        )
        .await?;

        Ok(RestoreOutcome {
            document: restored,
            backup,
            marker,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;
    use crate::block::BlockContent;
    use crate::content::{ContentStatus, DocumentMetadata};
    use crate::revision::{BlockChangeType, BlockRevision};

    fn target() -> Revision {
        let block = |id, order, content| BlockRevision {
            id,
            revision_id: 5,
            original_block_id: id + 100,
            order,
            content,
            change_type: BlockChangeType::Modified,
        };
        Revision {
            id: 5,
            content_id: 1,
            revision_number: 2,
            metadata: DocumentMetadata {
                title: "Draft".into(),
                description: None,
                content_type: "article".into(),
                author: "ann".into(),
                tags: vec![],
                category: None,
                featured: false,
                image_url: None,
                status: ContentStatus::Draft,
                slug: "draft".into(),
            },
            changes_summary: None,
            change_type: RevisionChangeType::Edit,
            created_by: "ann".into(),
            created_at: chrono::Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
            blocks: vec![
                block(2, 1, BlockContent::heading("H1", 1)),
                block(1, 0, BlockContent::paragraph("intro")),
            ],
        }
    }

    #[test]
    fn blocks_from_revision_keeps_order_and_data() {
        let blocks = blocks_from_revision(&target()).unwrap();
        assert_eq!(
            blocks,
            vec![
                NewBlock {
                    order: 0,
                    content: BlockContent::paragraph("intro"),
                },
                NewBlock {
                    order: 1,
                    content: BlockContent::heading("H1", 1),
                },
            ]
        );
    }

    #[test]
    fn blocks_failing_validation_are_not_restored() {
        let mut target = target();
        target.blocks[0].content = BlockContent::heading("H1", 0);
        assert_matches!(
            blocks_from_revision(&target),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn summaries_reference_the_target() {
        let target = target();
        assert_eq!(
            backup_summary(&target, "bob"),
            "Automatic backup before restoring to revision #2 (requested by bob)"
        );
        assert_eq!(
            marker_summary(&target, "bob"),
            "Restored to revision #2 from 2026-03-01 09:30:00 UTC by bob"
        );
    }

    #[test]
    fn stage_names() {
        assert_eq!(RestoreStage::Backup.as_str(), "backup");
        assert_eq!(RestoreStage::RestoreMarker.to_string(), "restore_marker");
    }
}
