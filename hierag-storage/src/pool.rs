//! ABOUTME: Connection pool configuration and lifecycle (§4.7, §5)
//! ABOUTME: Thin wrapper over deadpool-postgres, sized for the ingestion worker pool

use deadpool_postgres::{Config as DeadpoolConfig, ManagerConfig, Pool, RecyclingMethod, Runtime};
use hierag_core::error::{HieragError, Result};
use tokio_postgres::NoTls;

/// Connection parameters for the PostgreSQL backend.
#[derive(Debug, Clone)]
pub struct PgStorageConfig {
    pub connection_string: String,
    pub max_pool_size: usize,
}

impl PgStorageConfig {
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            max_pool_size: 8,
        }
    }

    #[must_use]
    pub const fn with_max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }
}

/// Pooled PostgreSQL connection, sized to the worker pool (§5: ingestion
/// workers suspend on this pool when persisting or computing vectors).
pub struct PgPool {
    pool: Pool,
}

impl PgPool {
    /// # Errors
    ///
    /// Returns [`HieragError::PersistenceError`] if the pool cannot be built
    /// (malformed connection string, no manager available).
    pub fn new(config: &PgStorageConfig) -> Result<Self> {
        let mut deadpool_config = DeadpoolConfig::new();
        deadpool_config.url = Some(config.connection_string.clone());
        deadpool_config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        deadpool_config.pool = Some(deadpool_postgres::PoolConfig::new(config.max_pool_size));

        let pool = deadpool_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| HieragError::PersistenceError {
                message: format!("failed to create connection pool: {e}"),
            })?;

        Ok(Self { pool })
    }

    /// Borrow a connection from the pool.
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::PersistenceError`] if the pool is exhausted or
    /// a connection cannot be established.
    pub async fn get(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| HieragError::PersistenceError {
                message: format!("failed to acquire connection: {e}"),
            })
    }

    /// Cheap liveness probe (`SELECT 1`).
    pub async fn is_healthy(&self) -> bool {
        match self.get().await {
            Ok(client) => client.simple_query("SELECT 1").await.is_ok(),
            Err(_) => false,
        }
    }

    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let status = self.pool.status();
        PoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
        }
    }
}

/// Snapshot of pool occupancy, decoupled from `deadpool`'s own status type
/// so callers don't need a direct `deadpool` dependency.
#[derive(Debug, Clone, Copy)]
pub struct PoolStatus {
    pub max_size: usize,
    pub size: usize,
    pub available: isize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_a_sane_pool_size() {
        let config = PgStorageConfig::new("postgresql://localhost/hierag");
        assert_eq!(config.max_pool_size, 8);
    }

    #[test]
    fn with_max_pool_size_overrides_default() {
        let config = PgStorageConfig::new("postgresql://localhost/hierag").with_max_pool_size(16);
        assert_eq!(config.max_pool_size, 16);
    }
}
