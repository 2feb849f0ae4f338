//! Handlers for the revision resource.
//!
//! Revisions are nested under contents for history, snapshot, retention and
//! restore: `/contents/{content_id}/revisions[/{id}/restore]`. Single
//! revisions and comparisons are addressed directly under `/revisions`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use folio_core::diff::RevisionComparison;
use folio_core::revision::{Revision, RevisionChangeType};
use folio_core::types::DbId;
use folio_core::versioning::RestoreOutcome;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::query::{CompareParams, HistoryParams, RetentionParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /contents/{content_id}/revisions`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRevisionRequest {
    /// Defaults to `edit`.
    pub change_type: Option<RevisionChangeType>,
    #[validate(length(max = 1000))]
    pub changes_summary: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub created_by: String,
}

/// Body of `POST /contents/{content_id}/revisions/{id}/restore`.
#[derive(Debug, Deserialize, Validate)]
pub struct RestoreRequest {
    #[validate(length(min = 1, max = 255))]
    pub restored_by: String,
}

/// Result of a retention run for one document.
#[derive(Debug, Serialize)]
pub struct RetentionResult {
    pub content_id: DbId,
    pub keep_count: i64,
    pub deleted: u64,
}

/// Reject actor names that are only whitespace.
fn require_actor<'a>(field: &str, value: &'a str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("'{field}' must not be blank")));
    }
    Ok(trimmed)
}

/// GET /api/v1/contents/{content_id}/revisions
///
/// Revision history, newest first. `?limit=` defaults to 50, max 200.
pub async fn list_history(
    State(state): State<AppState>,
    Path(content_id): Path<DbId>,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<DataResponse<Vec<Revision>>>> {
    let revisions = state
        .engine
        .get_revision_history(content_id, params.limit)
        .await?;
    Ok(Json(DataResponse { data: revisions }))
}

/// POST /api/v1/contents/{content_id}/revisions
///
/// Snapshot the document as it is now.
pub async fn create_revision(
    State(state): State<AppState>,
    Path(content_id): Path<DbId>,
    Json(body): Json<CreateRevisionRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Revision>>)> {
    body.validate()?;
    let created_by = require_actor("created_by", &body.created_by)?;

    let revision = state
        .engine
        .create_revision(
            content_id,
            body.change_type.unwrap_or(RevisionChangeType::Edit),
            body.changes_summary.as_deref(),
            created_by,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: revision })))
}

/// DELETE /api/v1/contents/{content_id}/revisions
///
/// Keep the newest `?keep_count=` revisions (default from configuration).
pub async fn cleanup(
    State(state): State<AppState>,
    Path(content_id): Path<DbId>,
    Query(params): Query<RetentionParams>,
) -> AppResult<Json<DataResponse<RetentionResult>>> {
    let keep_count = params
        .keep_count
        .unwrap_or(state.config.versioning.keep_count);
    let deleted = state
        .engine
        .cleanup_old_revisions(content_id, keep_count)
        .await?;
    Ok(Json(DataResponse {
        data: RetentionResult {
            content_id,
            keep_count,
            deleted,
        },
    }))
}

/// POST /api/v1/contents/{content_id}/revisions/{id}/restore
///
/// Revert the document to revision `id`, appending a backup and a restore
/// marker to its history.
pub async fn restore(
    State(state): State<AppState>,
    Path((content_id, id)): Path<(DbId, DbId)>,
    Json(body): Json<RestoreRequest>,
) -> AppResult<Json<DataResponse<RestoreOutcome>>> {
    body.validate()?;
    let restored_by = require_actor("restored_by", &body.restored_by)?;

    let outcome = state
        .engine
        .restore_to_revision(content_id, id, restored_by)
        .await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// GET /api/v1/revisions/compare?from=&to=
pub async fn compare(
    State(state): State<AppState>,
    Query(params): Query<CompareParams>,
) -> AppResult<Json<DataResponse<RevisionComparison>>> {
    let comparison = state
        .engine
        .compare_revisions(params.from, params.to)
        .await?;
    Ok(Json(DataResponse { data: comparison }))
}

/// GET /api/v1/revisions/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Revision>>> {
    let revision = state.engine.get_revision(id).await?;
    Ok(Json(DataResponse { data: revision }))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn blank_actor_is_rejected() {
        assert_matches!(require_actor("created_by", "   "), Err(AppError::BadRequest(_)));
        assert_eq!(require_actor("created_by", " ann ").unwrap(), "ann");
    }

    #[test]
    fn create_request_rules() {
        let ok = CreateRevisionRequest {
            change_type: None,
            changes_summary: Some("typo".into()),
            created_by: "ann".into(),
        };
        assert!(ok.validate().is_ok());

        let empty = CreateRevisionRequest {
            change_type: Some(RevisionChangeType::Publish),
            changes_summary: None,
            created_by: String::new(),
        };
        assert!(empty.validate().is_err());

        let long = CreateRevisionRequest {
            change_type: None,
            changes_summary: Some("x".repeat(1001)),
            created_by: "ann".into(),
        };
        assert!(long.validate().is_err());
    }
}
