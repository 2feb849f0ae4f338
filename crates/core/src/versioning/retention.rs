//! Bounded pruning of a document's revision log.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

use super::store::StoreTx;

/// Revisions kept per document when the caller does not say otherwise.
pub const DEFAULT_KEEP_COUNT: i64 = 50;

/// Reject keep counts that would empty the log.
///
/// Keeping at least the newest revision means `max(revision_number)` never
/// goes backwards, so numbers are never handed out twice.
pub fn validate_keep_count(keep_count: i64) -> Result<usize, CoreError> {
    if keep_count < 1 {
        return Err(CoreError::Validation(format!(
            "keep_count must be at least 1, got {keep_count}"
        )));
    }
    Ok(usize::try_from(keep_count).unwrap_or(usize::MAX))
}

/// The ids beyond the first `keep` of a newest-first list.
pub fn revisions_to_prune(ids_newest_first: &[DbId], keep: usize) -> &[DbId] {
    ids_newest_first.get(keep..).unwrap_or(&[])
}

/// Delete every revision of `content_id` beyond the newest `keep`.
pub(crate) async fn prune(
    tx: &mut dyn StoreTx,
    content_id: DbId,
    keep: usize,
) -> Result<u64, CoreError> {
    let ids = tx.revision_ids_newest_first(content_id).await?;
    let doomed = revisions_to_prune(&ids, keep);
    if doomed.is_empty() {
        return Ok(0);
    }
    tx.delete_revisions(doomed).await
}

/// Totals from one retention pass over every document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetentionSweep {
    pub documents: usize,
    pub deleted: u64,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn keeps_the_newest_entries() {
        let ids = [50, 40, 30, 20, 10];
        assert_eq!(revisions_to_prune(&ids, 2), &[30, 20, 10]);
        assert_eq!(revisions_to_prune(&ids, 5), &[] as &[DbId]);
        assert_eq!(revisions_to_prune(&ids, 50), &[] as &[DbId]);
        assert_eq!(revisions_to_prune(&[], 3), &[] as &[DbId]);
    }

    #[test]
    fn keep_count_must_be_positive() {
        assert_eq!(validate_keep_count(1).unwrap(), 1);
        assert_eq!(validate_keep_count(DEFAULT_KEEP_COUNT).unwrap(), 50);
        assert_matches!(validate_keep_count(0), Err(CoreError::Validation(_)));
        assert_matches!(validate_keep_count(-4), Err(CoreError::Validation(_)));
    }
}
