pub mod health;
pub mod revisions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /contents/{content_id}/revisions                 history (GET), snapshot (POST), retention (DELETE)
/// /contents/{content_id}/revisions/{id}/restore    restore (POST)
///
/// /revisions/compare?from=&to=                     compare (GET)
/// /revisions/{id}                                  get (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(revisions::router())
}
