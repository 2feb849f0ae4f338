//! Public façade over snapshot, restore, diff and retention.

use std::sync::Arc;

use crate::diff::{self, RevisionComparison};
use crate::error::CoreError;
use crate::revision::{Revision, RevisionChangeType};
use crate::types::DbId;

use super::numbering::RetryPolicy;
use super::restore::{RestoreOutcome, RestoreRun};
use super::retention::{self, RetentionSweep};
use super::snapshot;
use super::store::RevisionStore;

/// Default number of revisions returned by a history listing.
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Upper bound on a single history listing.
pub const MAX_HISTORY_LIMIT: i64 = 200;

/// Clamp a user-provided history limit into `1..=MAX_HISTORY_LIMIT`.
pub fn clamp_history_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

/// Entry point for every revision operation.
///
/// Cheap to clone; the store is shared behind an `Arc`.
#[derive(Clone)]
pub struct VersioningEngine {
    store: Arc<dyn RevisionStore>,
    retry: RetryPolicy,
}

impl VersioningEngine {
    pub fn new(store: Arc<dyn RevisionStore>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &Arc<dyn RevisionStore> {
        &self.store
    }

    /// Snapshot the current state of a document as a new revision.
    pub async fn create_revision(
        &self,
        content_id: DbId,
        change_type: RevisionChangeType,
        changes_summary: Option<&str>,
        created_by: &str,
    ) -> Result<Revision, CoreError> {
        let revision = self
            .retry
            .run("create_revision", move || {
                self.try_create_revision(content_id, change_type, changes_summary, created_by)
            })
            .await?;

        tracing::info!(
            content_id,
            revision_id = revision.id,
            revision_number = revision.revision_number,
            change_type = %change_type,
            created_by,
            "Revision created"
        );
        Ok(revision)
    }

    async fn try_create_revision(
        &self,
        content_id: DbId,
        change_type: RevisionChangeType,
        changes_summary: Option<&str>,
        created_by: &str,
    ) -> Result<Revision, CoreError> {
        let mut tx = self.store.begin().await?;
        let revision = snapshot::create_revision(
            tx.as_mut(),
            content_id,
            change_type,
            changes_summary,
            created_by,
        )
        .await?;
        tx.commit().await?;
        Ok(revision)
    }

    /// Revisions of a document, newest first.
    pub async fn get_revision_history(
        &self,
        content_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<Revision>, CoreError> {
        self.store
            .list_revisions(content_id, clamp_history_limit(limit))
            .await
    }

    pub async fn get_revision(&self, revision_id: DbId) -> Result<Revision, CoreError> {
        self.store
            .find_revision(revision_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Revision",
                id: revision_id,
            })
    }

    /// Revert a document to `revision_id`, appending a backup and a restore
    /// marker revision. All or nothing.
    pub async fn restore_to_revision(
        &self,
        content_id: DbId,
        revision_id: DbId,
        restored_by: &str,
    ) -> Result<RestoreOutcome, CoreError> {
        let outcome = self
            .retry
            .run("restore_to_revision", move || {
                self.try_restore(content_id, revision_id, restored_by)
            })
            .await?;

        tracing::info!(
            content_id,
            target_revision_id = revision_id,
            backup_revision = outcome.backup.revision_number,
            marker_revision = outcome.marker.revision_number,
            restored_by,
            "Content restored"
        );
        Ok(outcome)
    }

    async fn try_restore(
        &self,
        content_id: DbId,
        revision_id: DbId,
        restored_by: &str,
    ) -> Result<RestoreOutcome, CoreError> {
        let mut tx = self.store.begin().await?;
        let mut run = RestoreRun::new(tx.as_mut(), content_id, revision_id, restored_by);
        let outcome = match run.execute().await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    content_id,
                    target_revision_id = revision_id,
                    stage = %run.stage(),
                    error = %err,
                    "Restore aborted, rolling back"
                );
                return Err(err);
            }
        };
        tx.commit().await?;
        Ok(outcome)
    }

    /// Diff two revisions of the same document.
    ///
    /// Revisions of different documents are rejected with
    /// [`CoreError::ReferenceMismatch`].
    pub async fn compare_revisions(
        &self,
        revision_id1: DbId,
        revision_id2: DbId,
    ) -> Result<RevisionComparison, CoreError> {
        let revision1 = self.get_revision(revision_id1).await?;
        let revision2 = self.get_revision(revision_id2).await?;

        if revision1.content_id != revision2.content_id {
            return Err(CoreError::ReferenceMismatch {
                revision_id: revision2.id,
                expected_content_id: revision1.content_id,
                actual_content_id: revision2.content_id,
            });
        }

        let changes = diff::compare_revisions(&revision1, &revision2);
        Ok(RevisionComparison {
            revision1,
            revision2,
            changes,
        })
    }

    /// Keep the newest `keep_count` revisions of a document, delete the rest.
    /// Returns the number of revisions deleted.
    pub async fn cleanup_old_revisions(
        &self,
        content_id: DbId,
        keep_count: i64,
    ) -> Result<u64, CoreError> {
        let keep = retention::validate_keep_count(keep_count)?;

        let mut tx = self.store.begin().await?;
        let deleted = retention::prune(tx.as_mut(), content_id, keep).await?;
        tx.commit().await?;

        if deleted > 0 {
            tracing::info!(content_id, keep_count, deleted, "Old revisions pruned");
        } else {
            tracing::debug!(content_id, keep_count, "No revisions to prune");
        }
        Ok(deleted)
    }

    /// Run [`Self::cleanup_old_revisions`] for every document with history.
    ///
    /// A failure on one document is logged and skipped.
    pub async fn sweep_retention(&self, keep_count: i64) -> Result<RetentionSweep, CoreError> {
        retention::validate_keep_count(keep_count)?;

        let mut sweep = RetentionSweep::default();
        for content_id in self.store.list_content_ids().await? {
            sweep.documents += 1;
            match self.cleanup_old_revisions(content_id, keep_count).await {
                Ok(deleted) => sweep.deleted += deleted,
                Err(err) => {
                    sweep.failed += 1;
                    tracing::warn!(content_id, error = %err, "Retention cleanup failed, skipping");
                }
            }
        }
        Ok(sweep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_limit_is_clamped() {
        assert_eq!(clamp_history_limit(None), DEFAULT_HISTORY_LIMIT);
        assert_eq!(clamp_history_limit(Some(0)), 1);
        assert_eq!(clamp_history_limit(Some(-3)), 1);
        assert_eq!(clamp_history_limit(Some(10)), 10);
        assert_eq!(clamp_history_limit(Some(10_000)), MAX_HISTORY_LIMIT);
    }
}
