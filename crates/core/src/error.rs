use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The revision exists but snapshots a different document.
    #[error(
        "Revision {revision_id} belongs to content {actual_content_id}, not content {expected_content_id}"
    )]
    ReferenceMismatch {
        revision_id: DbId,
        expected_content_id: DbId,
        actual_content_id: DbId,
    },

    /// Two writers allocated the same revision number. Transient; the whole
    /// transaction may be retried.
    #[error("Write conflict: {0}")]
    WriteConflict(String),

    /// Any other storage failure inside a transaction. Nothing was applied.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether retrying the whole operation might succeed.
    pub fn is_write_conflict(&self) -> bool {
        matches!(self, Self::WriteConflict(_))
    }
}
