use axum::routing::{get, post};
use axum::Router;

use crate::handlers::revisions;
use crate::state::AppState;

/// Revision routes, mounted under `/api/v1`.
///
/// ```text
/// GET    /contents/{content_id}/revisions              -> list_history
/// POST   /contents/{content_id}/revisions              -> create_revision
/// DELETE /contents/{content_id}/revisions              -> cleanup
/// POST   /contents/{content_id}/revisions/{id}/restore -> restore
/// GET    /revisions/compare                            -> compare
/// GET    /revisions/{id}                               -> get_by_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/contents/{content_id}/revisions",
            get(revisions::list_history)
                .post(revisions::create_revision)
                .delete(revisions::cleanup),
        )
        .route(
            "/contents/{content_id}/revisions/{id}/restore",
            post(revisions::restore),
        )
        .route("/revisions/compare", get(revisions::compare))
        .route("/revisions/{id}", get(revisions::get_by_id))
}
