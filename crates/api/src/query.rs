//! Query parameter types for the revision endpoints.

use folio_core::types::DbId;
use serde::Deserialize;

/// `?limit=` for history listings. Clamped by the engine.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

/// `?keep_count=` for retention. Falls back to the configured keep count.
#[derive(Debug, Deserialize)]
pub struct RetentionParams {
    pub keep_count: Option<i64>,
}

/// `?from=&to=` revision ids for a comparison.
#[derive(Debug, Deserialize)]
pub struct CompareParams {
    pub from: DbId,
    pub to: DbId,
}
