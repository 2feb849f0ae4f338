use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use folio_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `folio_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A request body that failed its declared field rules.
    #[error("Invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// HTTP status, machine-readable code and client-facing message.
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::ReferenceMismatch { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "REFERENCE_MISMATCH",
                    core.to_string(),
                ),
                CoreError::WriteConflict(msg) => {
                    tracing::warn!(error = %msg, "Revision write conflict surfaced to client");
                    (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        "Concurrent revision write, please retry".to_string(),
                    )
                }
                CoreError::Transaction(msg) => {
                    tracing::error!(error = %msg, "Transaction failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "TRANSACTION_FAILED",
                        "The operation was rolled back".to_string(),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                errors.to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: CoreError) -> (StatusCode, &'static str) {
        let (status, code, _) = AppError::from(err).classify();
        (status, code)
    }

    #[test]
    fn core_errors_map_to_statuses() {
        assert_eq!(
            status_of(CoreError::NotFound {
                entity: "Revision",
                id: 1
            }),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
        assert_eq!(
            status_of(CoreError::Validation("bad".into())),
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        );
        assert_eq!(
            status_of(CoreError::ReferenceMismatch {
                revision_id: 3,
                expected_content_id: 1,
                actual_content_id: 2
            }),
            (StatusCode::UNPROCESSABLE_ENTITY, "REFERENCE_MISMATCH")
        );
        assert_eq!(
            status_of(CoreError::WriteConflict("dup".into())),
            (StatusCode::CONFLICT, "CONFLICT")
        );
        assert_eq!(
            status_of(CoreError::Transaction("boom".into())),
            (StatusCode::INTERNAL_SERVER_ERROR, "TRANSACTION_FAILED")
        );
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let (_, _, message) = AppError::from(CoreError::Internal("pg password".into())).classify();
        assert_eq!(message, "An internal error occurred");
    }
}
