//! In-memory [`RevisionStore`] for tests and local tooling.
//!
//! A transaction takes the store-wide lock for its whole lifetime, works on
//! a private copy of the state and swaps it in on commit. Dropping the
//! transaction discards the copy. Faults can be injected to exercise the
//! engine's conflict retry and rollback paths.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::block::BlockContent;
use crate::content::{Block, Document, DocumentMetadata, NewBlock};
use crate::error::CoreError;
use crate::revision::{BlockRevision, NewRevision, Revision, RevisionChangeType};
use crate::types::DbId;

use super::numbering;
use super::store::{RevisionStore, StoreTx};

/// A step at which the store can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Fail when inserting a revision of this change type.
    InsertRevision(RevisionChangeType),
    UpdateMetadata,
    ReplaceBlocks,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    last_id: DbId,
    documents: BTreeMap<DbId, Document>,
    revisions: BTreeMap<DbId, Revision>,
}

impl MemoryState {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn document_mut(&mut self, content_id: DbId) -> Result<&mut Document, CoreError> {
        self.documents
            .get_mut(&content_id)
            .ok_or(CoreError::NotFound {
                entity: "Content",
                id: content_id,
            })
    }

    fn revisions_newest_first(&self, content_id: DbId) -> Vec<&Revision> {
        let mut revisions: Vec<&Revision> = self
            .revisions
            .values()
            .filter(|r| r.content_id == content_id)
            .collect();
        revisions.sort_by(|a, b| b.revision_number.cmp(&a.revision_number));
        revisions
    }
}

#[derive(Debug, Default)]
struct Faults {
    pending_conflicts: u32,
    fail_point: Option<FailPoint>,
}

/// Process-local store backed by ordered maps.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Mutex<Faults>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document with `blocks` in the given order.
    ///
    /// Every block must pass [`BlockContent::validate`].
    pub async fn create_document(
        &self,
        metadata: DocumentMetadata,
        blocks: Vec<BlockContent>,
    ) -> Result<Document, CoreError> {
        for block in &blocks {
            block.validate()?;
        }
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let now = Utc::now();
        let mut document = Document {
            id,
            metadata,
            version: 1,
            blocks: Vec::with_capacity(blocks.len()),
            created_at: now,
            updated_at: now,
        };
        for (order, content) in (0..).zip(blocks) {
            let block_id = state.next_id();
            document.blocks.push(Block {
                id: block_id,
                content_id: id,
                order,
                content,
            });
        }
        state.documents.insert(id, document.clone());
        Ok(document)
    }

    /// Committed state of a document.
    pub async fn document(&self, content_id: DbId) -> Option<Document> {
        self.state.lock().await.documents.get(&content_id).cloned()
    }

    /// Overwrite a document's metadata as an editor would.
    pub async fn update_document(
        &self,
        content_id: DbId,
        metadata: DocumentMetadata,
    ) -> Result<Document, CoreError> {
        let mut state = self.state.lock().await;
        let document = state.document_mut(content_id)?;
        document.metadata = metadata;
        document.version += 1;
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    /// Append a block after the current last one.
    pub async fn append_block(
        &self,
        content_id: DbId,
        content: BlockContent,
    ) -> Result<Block, CoreError> {
        content.validate()?;
        let mut state = self.state.lock().await;
        let block_id = state.next_id();
        let document = state.document_mut(content_id)?;
        let order = document.blocks.iter().map(|b| b.order + 1).max().unwrap_or(0);
        let block = Block {
            id: block_id,
            content_id,
            order,
            content,
        };
        document.blocks.push(block.clone());
        Ok(block)
    }

    /// Remove a document. Its revisions stay.
    pub async fn delete_document(&self, content_id: DbId) -> bool {
        self.state
            .lock()
            .await
            .documents
            .remove(&content_id)
            .is_some()
    }

    /// Number of committed revisions for a document.
    pub async fn revision_count(&self, content_id: DbId) -> usize {
        self.state
            .lock()
            .await
            .revisions
            .values()
            .filter(|r| r.content_id == content_id)
            .count()
    }

    /// Make the next `count` revision inserts fail with a write conflict, as
    /// if another writer had taken the number first.
    pub async fn inject_write_conflicts(&self, count: u32) {
        self.faults.lock().await.pending_conflicts = count;
    }

    /// Fail every transaction that reaches `point` until cleared.
    pub async fn fail_at(&self, point: FailPoint) {
        self.faults.lock().await.fail_point = Some(point);
    }

    pub async fn clear_faults(&self) {
        *self.faults.lock().await = Faults::default();
    }
}

#[async_trait]
impl RevisionStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, CoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            faults: Arc::clone(&self.faults),
        }))
    }

    async fn find_revision(&self, revision_id: DbId) -> Result<Option<Revision>, CoreError> {
        Ok(self.state.lock().await.revisions.get(&revision_id).cloned())
    }

    async fn list_revisions(
        &self,
        content_id: DbId,
        limit: i64,
    ) -> Result<Vec<Revision>, CoreError> {
        let state = self.state.lock().await;
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(state
            .revisions_newest_first(content_id)
            .into_iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_content_ids(&self) -> Result<Vec<DbId>, CoreError> {
        let state = self.state.lock().await;
        let ids: BTreeSet<DbId> = state.revisions.values().map(|r| r.content_id).collect();
        Ok(ids.into_iter().collect())
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<Mutex<Faults>>,
}

impl MemoryTx {
    async fn check(&self, point: FailPoint) -> Result<(), CoreError> {
        if self.faults.lock().await.fail_point == Some(point) {
            return Err(CoreError::Transaction(format!(
                "injected failure at {point:?}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn load_document(&mut self, content_id: DbId) -> Result<Option<Document>, CoreError> {
        Ok(self.working.documents.get(&content_id).cloned().map(|mut doc| {
            doc.sort_blocks();
            doc
        }))
    }

    async fn find_revision(&mut self, revision_id: DbId) -> Result<Option<Revision>, CoreError> {
        Ok(self.working.revisions.get(&revision_id).cloned())
    }

    async fn next_revision_number(&mut self, content_id: DbId) -> Result<i32, CoreError> {
        let highest = self
            .working
            .revisions
            .values()
            .filter(|r| r.content_id == content_id)
            .map(|r| r.revision_number)
            .max();
        Ok(numbering::next_after(highest))
    }

    async fn insert_revision(&mut self, revision: &NewRevision) -> Result<Revision, CoreError> {
        self.check(FailPoint::InsertRevision(revision.change_type))
            .await?;
        {
            let mut faults = self.faults.lock().await;
            if faults.pending_conflicts > 0 {
                faults.pending_conflicts -= 1;
                return Err(CoreError::WriteConflict(format!(
                    "revision {} of content {} was taken by a concurrent writer",
                    revision.revision_number, revision.content_id
                )));
            }
        }
        let taken = self.working.revisions.values().any(|r| {
            r.content_id == revision.content_id && r.revision_number == revision.revision_number
        });
        if taken {
            return Err(CoreError::WriteConflict(format!(
                "revision {} of content {} already exists",
                revision.revision_number, revision.content_id
            )));
        }

        let id = self.working.next_id();
        let mut blocks = Vec::with_capacity(revision.blocks.len());
        for block in &revision.blocks {
            blocks.push(BlockRevision {
                id: self.working.next_id(),
                revision_id: id,
                original_block_id: block.original_block_id,
                order: block.order,
                content: block.content.clone(),
                change_type: block.change_type,
            });
        }
        blocks.sort_by_key(|b| (b.order, b.id));

        let stored = Revision {
            id,
            content_id: revision.content_id,
            revision_number: revision.revision_number,
            metadata: revision.metadata.clone(),
            changes_summary: revision.changes_summary.clone(),
            change_type: revision.change_type,
            created_by: revision.created_by.clone(),
            created_at: Utc::now(),
            blocks,
        };
        self.working.revisions.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_metadata(
        &mut self,
        content_id: DbId,
        metadata: &DocumentMetadata,
    ) -> Result<(), CoreError> {
        self.check(FailPoint::UpdateMetadata).await?;
        let document = self.working.document_mut(content_id)?;
        document.metadata = metadata.clone();
        document.version += 1;
        document.updated_at = Utc::now();
        Ok(())
    }

    async fn replace_blocks(
        &mut self,
        content_id: DbId,
        blocks: &[NewBlock],
    ) -> Result<Vec<Block>, CoreError> {
        self.check(FailPoint::ReplaceBlocks).await?;
        self.working.document_mut(content_id)?;
        for block in blocks {
            block.content.validate()?;
        }

        let mut fresh = Vec::with_capacity(blocks.len());
        for block in blocks {
            fresh.push(Block {
                id: self.working.next_id(),
                content_id,
                order: block.order,
                content: block.content.clone(),
            });
        }
        fresh.sort_by_key(|b| (b.order, b.id));

        let document = self.working.document_mut(content_id)?;
        document.blocks = fresh.clone();
        Ok(fresh)
    }

    async fn revision_ids_newest_first(
        &mut self,
        content_id: DbId,
    ) -> Result<Vec<DbId>, CoreError> {
        Ok(self
            .working
            .revisions_newest_first(content_id)
            .into_iter()
            .map(|r| r.id)
            .collect())
    }

    async fn delete_revisions(&mut self, revision_ids: &[DbId]) -> Result<u64, CoreError> {
        let mut deleted = 0;
        for id in revision_ids {
            if self.working.revisions.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn commit(self: Box<Self>) -> Result<(), CoreError> {
        self.check(FailPoint::Commit).await?;
        let MemoryTx {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::content::ContentStatus;
    use crate::revision::NewBlockRevision;

    fn metadata() -> DocumentMetadata {
        DocumentMetadata {
            title: "Doc".into(),
            description: None,
            content_type: "article".into(),
            author: "ann".into(),
            tags: vec![],
            category: None,
            featured: false,
            image_url: None,
            status: ContentStatus::Draft,
            slug: "doc".into(),
        }
    }

    fn new_revision(content_id: DbId, number: i32) -> NewRevision {
        NewRevision {
            content_id,
            revision_number: number,
            metadata: metadata(),
            changes_summary: None,
            change_type: RevisionChangeType::Edit,
            created_by: "ann".into(),
            blocks: vec![NewBlockRevision {
                original_block_id: 1,
                order: 0,
                content: BlockContent::paragraph("p"),
                change_type: crate::revision::BlockChangeType::Modified,
            }],
        }
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = InMemoryStore::new();
        let doc = store.create_document(metadata(), vec![]).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_revision(&new_revision(doc.id, 1)).await.unwrap();
            tx.replace_blocks(
                doc.id,
                &[NewBlock {
                    order: 0,
                    content: BlockContent::paragraph("new"),
                }],
            )
            .await
            .unwrap();
        }

        assert_eq!(store.revision_count(doc.id).await, 0);
        assert!(store.document(doc.id).await.unwrap().blocks.is_empty());
    }

    #[tokio::test]
    async fn committed_transaction_is_visible() {
        let store = InMemoryStore::new();
        let doc = store.create_document(metadata(), vec![]).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let revision = tx.insert_revision(&new_revision(doc.id, 1)).await.unwrap();
        tx.commit().await.unwrap();

        let loaded = store.find_revision(revision.id).await.unwrap().unwrap();
        assert_eq!(loaded, revision);
        assert_eq!(loaded.blocks[0].revision_id, revision.id);
    }

    #[tokio::test]
    async fn duplicate_revision_number_is_a_write_conflict() {
        let store = InMemoryStore::new();
        let doc = store.create_document(metadata(), vec![]).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_revision(&new_revision(doc.id, 1)).await.unwrap();
        let result = tx.insert_revision(&new_revision(doc.id, 1)).await;
        assert_matches!(result, Err(CoreError::WriteConflict(_)));
    }

    #[tokio::test]
    async fn injected_conflicts_are_consumed() {
        let store = InMemoryStore::new();
        let doc = store.create_document(metadata(), vec![]).await.unwrap();
        store.inject_write_conflicts(1).await;

        let mut tx = store.begin().await.unwrap();
        assert_matches!(
            tx.insert_revision(&new_revision(doc.id, 1)).await,
            Err(CoreError::WriteConflict(_))
        );
        assert!(tx.insert_revision(&new_revision(doc.id, 1)).await.is_ok());
    }

    #[tokio::test]
    async fn append_block_goes_last() {
        let store = InMemoryStore::new();
        let doc = store
            .create_document(metadata(), vec![BlockContent::paragraph("a")])
            .await
            .unwrap();
        let block = store
            .append_block(doc.id, BlockContent::quote("x"))
            .await
            .unwrap();
        assert_eq!(block.order, 1);
        assert_matches!(
            store.append_block(999, BlockContent::Divider {}).await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn invalid_blocks_are_rejected_on_write() {
        let store = InMemoryStore::new();
        assert_matches!(
            store
                .create_document(metadata(), vec![BlockContent::heading("Title", 9)])
                .await,
            Err(CoreError::Validation(_))
        );

        let doc = store.create_document(metadata(), vec![]).await.unwrap();
        assert_matches!(
            store.append_block(doc.id, BlockContent::paragraph("  ")).await,
            Err(CoreError::Validation(_))
        );
        assert!(store.document(doc.id).await.unwrap().blocks.is_empty());
    }
}
