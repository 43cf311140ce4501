// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! MySQL backend
//!
//! Pool-per-process integration mirroring the PostgreSQL adapter. The tables
//! targeted by classified model definitions are carried for logging and
//! introspection; schema management stays with the caller.

use std::{fmt, time::Duration};

use datastore_client::{Datastore, DatastoreError, HealthStatus};
use sqlx::{MySqlPool, mysql::MySqlPoolOptions};
use tracing::info;

const BACKEND: &str = "mysql";

/// Configuration for the MySQL backend
#[derive(Debug, Clone)]
pub struct MySqlConfig {
    /// Connection URL, e.g. `mysql://localhost/app`
    pub url: String,
    /// Maximum pool size
    pub max_connections: u32,
    /// Pool acquire timeout in seconds
    pub acquire_timeout_seconds: u64,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            acquire_timeout_seconds: 5,
        }
    }
}

/// Configured but not yet connected MySQL backend
#[derive(Debug, Clone)]
pub struct MySqlStore {
    config: MySqlConfig,
    tables: Vec<String>,
}

impl MySqlStore {
    /// Create a new MySQL adapter from configuration and the classified table list
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Configuration` if the URL is empty.
    pub fn new(config: MySqlConfig, tables: Vec<String>) -> Result<Self, DatastoreError> {
        if config.url.trim().is_empty() {
            return Err(DatastoreError::Configuration {
                backend: BACKEND,
                message: "connection URL cannot be empty".to_string(),
            });
        }
        Ok(Self { config, tables })
    }

    /// Open the process-wide connection pool
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Connect` if the pool cannot be established.
    pub async fn connect(&self) -> Result<MySqlHandle, DatastoreError> {
        info!(tables = ?self.tables, "mysql initialising");

        let pool = MySqlPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(Duration::from_secs(self.config.acquire_timeout_seconds))
            .connect(&self.config.url)
            .await
            .map_err(|e| DatastoreError::Connect {
                backend: BACKEND,
                message: e.to_string(),
            })?;

        info!("mysql pool connected");
        Ok(MySqlHandle { pool })
    }
}

/// Live MySQL pool handle
#[derive(Clone)]
pub struct MySqlHandle {
    pool: MySqlPool,
}

impl MySqlHandle {
    /// The underlying connection pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to be returned
    pub async fn teardown(self) {
        self.pool.close().await;
    }
}

impl fmt::Debug for MySqlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlHandle").finish_non_exhaustive()
    }
}

impl Datastore for MySqlHandle {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn health_check(&self) -> Result<HealthStatus, DatastoreError> {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => Ok(HealthStatus::Up),
            Err(e) => Ok(HealthStatus::Down {
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_is_a_configuration_error() {
        let result = MySqlStore::new(MySqlConfig::default(), Vec::new());
        assert!(matches!(
            result,
            Err(DatastoreError::Configuration {
                backend: "mysql",
                ..
            })
        ));
    }

    #[test]
    fn tables_are_optional() {
        let store = MySqlStore::new(
            MySqlConfig {
                url: "mysql://localhost/app".to_string(),
                ..MySqlConfig::default()
            },
            Vec::new(),
        );
        assert!(store.is_ok());
    }
}
