//! PostgreSQL persistence for the content versioning backend.
//!
//! - [`models`]       -- row types and their conversion into core models
//! - [`repositories`] -- one zero-sized repo per table
//! - [`pg_store`]     -- the [`folio_core::versioning::RevisionStore`] backed by Postgres

pub mod models;
pub mod pg_store;
pub mod repositories;

pub use pg_store::PgRevisionStore;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to prove the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply every pending migration from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
