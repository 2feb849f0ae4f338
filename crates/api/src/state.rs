use std::sync::Arc;

use folio_core::versioning::VersioningEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Revision operations over the configured store.
    pub engine: VersioningEngine,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
