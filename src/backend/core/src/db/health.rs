//! Database health monitoring.
//!
//! Startup validation (connectivity + applied migrations) and a liveness
//! check used by the `/health` endpoint.

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::{CampusError, Result};

/// Point-in-time database health.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseHealth {
    pub healthy: bool,
    pub latency_ms: u64,
    pub pool_size: u32,
    pub idle_connections: usize,
}

/// Monitors a connection pool.
#[derive(Clone)]
pub struct DatabaseHealthMonitor {
    pool: PgPool,
}

impl DatabaseHealthMonitor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Validate the database at startup: connectivity and at least one
    /// applied migration. Fails the boot rather than serving requests
    /// against an unmigrated schema.
    pub async fn startup_validation(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;

        let (applied,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = TRUE")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    CampusError::internal(format!("migration table missing or unreadable: {e}"))
                })?;

        if applied == 0 {
            return Err(CampusError::internal("no migrations applied"));
        }

        info!(migrations = applied, "Database startup validation passed");
        Ok(())
    }

    /// Liveness probe with latency measurement.
    pub async fn check(&self) -> DatabaseHealth {
        let start = std::time::Instant::now();
        let healthy = sqlx::query("SELECT 1").execute(&self.pool).await.is_ok();
        let latency_ms = start.elapsed().as_millis() as u64;

        if !healthy {
            warn!(latency_ms, "Database health check failed");
        }

        DatabaseHealth {
            healthy,
            latency_ms,
            pool_size: self.pool.size(),
            idle_connections: self.pool.num_idle(),
        }
    }
}
