//! ABOUTME: Schema migrations (§4.7), applied once at startup via refinery

use hierag_core::error::{HieragError, Result};
use tokio_postgres::NoTls;

refinery::embed_migrations!("migrations");

/// Run all pending migrations against `connection_string`, connecting
/// directly (outside the pool) since refinery needs an owned, mutable
/// client for the duration of the run.
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] if the connection fails or any
/// migration errors out; refinery's transactional runner leaves the schema
/// at the last successful migration on failure.
pub async fn run_migrations(connection_string: &str) -> Result<()> {
    let (mut client, connection) = tokio_postgres::connect(connection_string, NoTls)
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to connect for migrations: {e}"),
        })?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(error = %e, "migration connection closed with error");
        }
    });

    migrations::runner()
        .run_async(&mut client)
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("migration failed: {e}"),
        })?;

    Ok(())
}
