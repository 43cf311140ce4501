// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! MongoDB document store backend
//!
//! The document backend resolves the collection set from the classified model
//! definitions at startup. An enabled document backend with no collections to
//! serve is treated as a malformed ontology and fails initialization.

use std::{fmt, time::Duration};

use datastore_client::{Datastore, DatastoreError, HealthStatus};
use mongodb::{Client, Database, bson::doc};
use tokio::time::timeout;
use tracing::info;

const BACKEND: &str = "mongo";

/// Configuration for the MongoDB backend
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Connection URL, e.g. `mongodb://localhost:27017/app`
    pub url: String,
    /// Database name; when empty, the default database from the URL is used
    pub database: String,
    /// Connect (ping) timeout in seconds
    pub connect_timeout_seconds: u64,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            database: String::new(),
            connect_timeout_seconds: 5,
        }
    }
}

/// Configured but not yet connected MongoDB backend
#[derive(Debug, Clone)]
pub struct MongoStore {
    config: MongoConfig,
    collections: Vec<String>,
}

impl MongoStore {
    /// Create a new MongoDB adapter from configuration and the collection
    /// names produced by model classification
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Configuration` if the URL is empty.
    pub fn new(config: MongoConfig, collections: Vec<String>) -> Result<Self, DatastoreError> {
        if config.url.trim().is_empty() {
            return Err(DatastoreError::Configuration {
                backend: BACKEND,
                message: "connection URL cannot be empty".to_string(),
            });
        }
        Ok(Self {
            config,
            collections,
        })
    }

    /// Open the process-wide client and verify the deployment with a ping
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::EmptyOntology` when no document collections
    /// were classified, `DatastoreError::Configuration` if no database can be
    /// resolved, `DatastoreError::Timeout` if the ping does not come back in
    /// time, or `DatastoreError::Connect` on any other failure.
    pub async fn connect(&self) -> Result<MongoHandle, DatastoreError> {
        // An enabled document backend with nothing to serve is a wiring bug,
        // caught here before any network round trip.
        if self.collections.is_empty() {
            return Err(DatastoreError::EmptyOntology { backend: BACKEND });
        }

        let client = Client::with_uri_str(&self.config.url)
            .await
            .map_err(|e| DatastoreError::Configuration {
                backend: BACKEND,
                message: e.to_string(),
            })?;

        let database = if self.config.database.trim().is_empty() {
            client
                .default_database()
                .ok_or_else(|| DatastoreError::Configuration {
                    backend: BACKEND,
                    message: "no database in URL and none configured".to_string(),
                })?
        } else {
            client.database(&self.config.database)
        };

        // The client connects lazily; ping to surface unreachable deployments
        // during the startup join rather than on first request.
        let connect_timeout = Duration::from_secs(self.config.connect_timeout_seconds);
        timeout(connect_timeout, database.run_command(doc! { "ping": 1 }))
            .await
            .map_err(|_| DatastoreError::Timeout {
                backend: BACKEND,
                timeout_seconds: self.config.connect_timeout_seconds,
            })?
            .map_err(|e| DatastoreError::Connect {
                backend: BACKEND,
                message: e.to_string(),
            })?;

        info!(
            database = %database.name(),
            collections = ?self.collections,
            "mongo initialised"
        );
        Ok(MongoHandle {
            client,
            database,
            collections: self.collections.clone(),
        })
    }
}

/// Live MongoDB handle with the resolved collection set
#[derive(Clone)]
pub struct MongoHandle {
    client: Client,
    database: Database,
    collections: Vec<String>,
}

impl MongoHandle {
    /// The underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The resolved database handle
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Collection names resolved at classification time
    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// Shut the client down, draining in-flight operations
    pub async fn teardown(self) {
        self.client.shutdown().await;
    }
}

impl fmt::Debug for MongoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoHandle")
            .field("collections", &self.collections)
            .finish_non_exhaustive()
    }
}

impl Datastore for MongoHandle {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn health_check(&self) -> Result<HealthStatus, DatastoreError> {
        match self.database.run_command(doc! { "ping": 1 }).await {
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
        let result = MongoStore::new(MongoConfig::default(), vec!["users".to_string()]);
        assert!(matches!(
            result,
            Err(DatastoreError::Configuration {
                backend: "mongo",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn empty_collection_set_is_fatal_before_io() {
        let store = MongoStore::new(
            MongoConfig {
                url: "mongodb://localhost:27017/app".to_string(),
                ..MongoConfig::default()
            },
            Vec::new(),
        )
        .expect("valid config");

        let result = store.connect().await;
        assert!(matches!(
            result,
            Err(DatastoreError::EmptyOntology { backend: "mongo" })
        ));
    }
}
