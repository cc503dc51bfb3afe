// antrian/server/src/db/mod.rs

pub mod pg_ledger;

pub use pg_ledger::PgLedger;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
  PgPoolOptions::new()
    .max_connections(max_connections)
    .connect(database_url)
    .await
}
