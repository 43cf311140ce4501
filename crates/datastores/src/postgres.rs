// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! PostgreSQL backend
//!
//! This module provides the SQL backend integration. One `sqlx` pool is opened
//! per process, together with the entity map derived from the classified model
//! definitions (model name to table name).

use std::{collections::BTreeMap, fmt, time::Duration};

use datastore_client::{Datastore, DatastoreError, HealthStatus};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

const BACKEND: &str = "postgres";

/// Configuration for the PostgreSQL backend
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Connection URL, e.g. `postgres://localhost/app`
    pub url: String,
    /// Maximum pool size
    pub max_connections: u32,
    /// Pool acquire timeout in seconds
    pub acquire_timeout_seconds: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            acquire_timeout_seconds: 5,
        }
    }
}

/// Configured but not yet connected PostgreSQL backend
#[derive(Debug, Clone)]
pub struct PostgresStore {
    config: PostgresConfig,
    entities: BTreeMap<String, String>,
}

impl PostgresStore {
    /// Create a new PostgreSQL adapter from configuration and the entity map
    /// produced by model classification
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Configuration` if the URL is empty.
    pub fn new(
        config: PostgresConfig,
        entities: BTreeMap<String, String>,
    ) -> Result<Self, DatastoreError> {
        if config.url.trim().is_empty() {
            return Err(DatastoreError::Configuration {
                backend: BACKEND,
                message: "connection URL cannot be empty".to_string(),
            });
        }
        Ok(Self { config, entities })
    }

    /// Open the process-wide connection pool
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Connect` if the pool cannot be established.
    pub async fn connect(&self) -> Result<PostgresHandle, DatastoreError> {
        info!(
            entities = ?self.entities.keys().collect::<Vec<_>>(),
            "postgres initialising"
        );

        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(Duration::from_secs(self.config.acquire_timeout_seconds))
            .connect(&self.config.url)
            .await
            .map_err(|e| DatastoreError::Connect {
                backend: BACKEND,
                message: e.to_string(),
            })?;

        info!("postgres pool connected");
        Ok(PostgresHandle {
            pool,
            entities: self.entities.clone(),
        })
    }
}

/// Live PostgreSQL pool handle with the derived entity map
#[derive(Clone)]
pub struct PostgresHandle {
    pool: PgPool,
    entities: BTreeMap<String, String>,
}

impl PostgresHandle {
    /// The underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Entity map derived at classification time: model name to table name
    pub fn entities(&self) -> &BTreeMap<String, String> {
        &self.entities
    }

    /// Close the pool, waiting for checked-out connections to be returned
    pub async fn teardown(self) {
        self.pool.close().await;
    }
}

impl fmt::Debug for PostgresHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresHandle")
            .field("entities", &self.entities)
            .finish_non_exhaustive()
    }
}

impl Datastore for PostgresHandle {
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
        let result = PostgresStore::new(PostgresConfig::default(), BTreeMap::new());
        assert!(matches!(
            result,
            Err(DatastoreError::Configuration {
                backend: "postgres",
                ..
            })
        ));
    }

    #[test]
    fn entities_survive_into_the_store() {
        let mut entities = BTreeMap::new();
        entities.insert("User".to_string(), "users".to_string());

        let store = PostgresStore::new(
            PostgresConfig {
                url: "postgres://localhost/app".to_string(),
                ..PostgresConfig::default()
            },
            entities,
        )
        .expect("valid config");

        assert_eq!(store.entities.get("User").map(String::as_str), Some("users"));
    }
}
