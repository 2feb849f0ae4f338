//! Per-document revision numbering.
//!
//! Numbers are allocated as `max + 1` inside the writing transaction. The
//! store serializes writers per document and rejects a duplicate
//! `(content_id, revision_number)` with [`CoreError::WriteConflict`];
//! [`RetryPolicy`] re-runs the whole transaction when that happens.

use std::future::Future;

use crate::error::CoreError;
use crate::types::DbId;

use super::store::StoreTx;

/// Default number of attempts for a write that keeps conflicting.
pub const DEFAULT_WRITE_ATTEMPTS: u32 = 3;

/// Number that follows `highest`, starting at 1 for an empty log.
pub fn next_after(highest: Option<i32>) -> i32 {
    highest.unwrap_or(0) + 1
}

/// Allocate the next revision number for `content_id` inside `tx`.
pub(crate) async fn allocate(tx: &mut dyn StoreTx, content_id: DbId) -> Result<i32, CoreError> {
    let number = tx.next_revision_number(content_id).await?;
    if number < 1 {
        return Err(CoreError::Internal(format!(
            "Store allocated invalid revision number {number} for content {content_id}"
        )));
    }
    tracing::debug!(content_id, revision_number = number, "Allocated revision number");
    Ok(number)
}

/// Bounded retry of whole transactions on [`CoreError::WriteConflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_WRITE_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Run `attempt_fn` until it succeeds, fails with a non-conflict error,
    /// or `max_attempts` conflicts have been seen.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt_fn: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match attempt_fn().await {
                Err(err) if err.is_write_conflict() => {
                    if attempt >= self.max_attempts {
                        tracing::error!(operation, attempt, error = %err, "Write conflict retries exhausted");
                        return Err(CoreError::WriteConflict(format!(
                            "{operation} gave up after {attempt} attempts: {err}"
                        )));
                    }
                    tracing::warn!(operation, attempt, error = %err, "Write conflict, retrying transaction");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn next_after_starts_at_one() {
        assert_eq!(next_after(None), 1);
        assert_eq!(next_after(Some(1)), 2);
        assert_eq!(next_after(Some(41)), 42);
    }

    #[test]
    fn policy_never_allows_zero_attempts() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
        assert_eq!(RetryPolicy::default().max_attempts, DEFAULT_WRITE_ATTEMPTS);
    }

    #[tokio::test]
    async fn retries_conflicts_until_success() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::new(3)
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(CoreError::WriteConflict("dup".into()))
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::new(2)
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(CoreError::WriteConflict("dup".into()))
            })
            .await;
        assert_matches!(result, Err(CoreError::WriteConflict(msg)) if msg.contains("2 attempts"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::new(5)
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(CoreError::NotFound {
                    entity: "Content",
                    id: 1,
                })
            })
            .await;
        assert_matches!(result, Err(CoreError::NotFound { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
