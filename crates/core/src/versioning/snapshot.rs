//! Capturing a document into an immutable revision.

use crate::content::Document;
use crate::error::CoreError;
use crate::revision::{BlockChangeType, NewBlockRevision, NewRevision, Revision, RevisionChangeType};
use crate::types::DbId;

use super::numbering;
use super::store::StoreTx;

/// Build the revision row for `document` as it is right now.
///
/// Every metadata field is copied and each block becomes one block snapshot
/// tagged [`BlockChangeType::Modified`], keeping its id as
/// `original_block_id`.
pub fn snapshot_of(
    document: &Document,
    revision_number: i32,
    change_type: RevisionChangeType,
    changes_summary: Option<String>,
    created_by: String,
) -> NewRevision {
    let mut blocks: Vec<NewBlockRevision> = document
        .blocks
        .iter()
        .map(|block| NewBlockRevision {
            original_block_id: block.id,
            order: block.order,
            content: block.content.clone(),
            change_type: BlockChangeType::Modified,
        })
        .collect();
    blocks.sort_by_key(|b| (b.order, b.original_block_id));

    NewRevision {
        content_id: document.id,
        revision_number,
        metadata: document.metadata.clone(),
        changes_summary,
        change_type,
        created_by,
        blocks,
    }
}

/// Allocate a number and append a snapshot of `document` inside `tx`.
pub(crate) async fn capture(
    tx: &mut dyn StoreTx,
    document: &Document,
    change_type: RevisionChangeType,
    changes_summary: Option<String>,
    created_by: String,
) -> Result<Revision, CoreError> {
    let number = numbering::allocate(tx, document.id).await?;
    let new_revision = snapshot_of(document, number, change_type, changes_summary, created_by);
    let revision = tx.insert_revision(&new_revision).await?;

    tracing::debug!(
        content_id = document.id,
        revision_id = revision.id,
        revision_number = revision.revision_number,
        change_type = %change_type,
        blocks = revision.blocks.len(),
        "Captured revision"
    );
    Ok(revision)
}

/// Snapshot the current state of `content_id` inside `tx`.
pub(crate) async fn create_revision(
    tx: &mut dyn StoreTx,
    content_id: DbId,
    change_type: RevisionChangeType,
    changes_summary: Option<&str>,
    created_by: &str,
) -> Result<Revision, CoreError> {
    let document = tx
        .load_document(content_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Content",
            id: content_id,
        })?;

    capture(
        tx,
        &document,
        change_type,
        changes_summary.map(str::to_owned),
        created_by.to_owned(),
    )
    .await
}
