//! Gatepass request store.
//!
//! The single source of truth for entry-request records. The
//! [`EntryStore`] trait is the boundary the coordinator works against; two
//! implementations are provided:
//!
//! - [`MemoryStore`] — in-process `HashMap` behind a mutex, used by tests
//!   and single-node deployments.
//! - [`PgStore`] — PostgreSQL via `sqlx`, where the compare-and-set is a
//!   conditional row `UPDATE`.

pub mod memory;
pub mod models;
pub mod pg;
pub mod repositories;
pub mod store;

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use store::{CasOutcome, EntryStore, StoreError};

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify that the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
