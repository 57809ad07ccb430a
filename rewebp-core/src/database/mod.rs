//! Database boundary: ports consumed by the engine and their Postgres
//! adapters.

pub mod ports;
pub mod repositories;

use sqlx::PgPool;

use crate::error::{ConvertError, Result};

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| ConvertError::Database(format!("Migration failed: {e}")))
}
