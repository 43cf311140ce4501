// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Redis cache backend
//!
//! This module provides the key-value cache integration. One multiplexed
//! connection (wrapped in a [`ConnectionManager`] for automatic reconnects) is
//! opened per process and shared by cloning.

use std::{fmt, time::Duration};

use datastore_client::{Datastore, DatastoreError, HealthStatus};
use redis::aio::ConnectionManager;
use tokio::time::timeout;
use tracing::{debug, info};

const BACKEND: &str = "redis";

/// Configuration for the Redis backend
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Connection URL, e.g. `redis://127.0.0.1:6379`
    pub url: String,
    /// Connect timeout in seconds
    pub connect_timeout_seconds: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connect_timeout_seconds: 5,
        }
    }
}

/// Configured but not yet connected Redis backend
#[derive(Debug, Clone)]
pub struct RedisStore {
    config: RedisConfig,
}

impl RedisStore {
    /// Create a new Redis adapter from configuration
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Configuration` if the URL is empty.
    pub fn new(config: RedisConfig) -> Result<Self, DatastoreError> {
        if config.url.trim().is_empty() {
            return Err(DatastoreError::Configuration {
                backend: BACKEND,
                message: "connection URL cannot be empty".to_string(),
            });
        }
        Ok(Self { config })
    }

    /// Open the process-wide Redis connection
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Configuration` if the URL does not parse,
    /// `DatastoreError::Timeout` if the connection cannot be established in
    /// time, or `DatastoreError::Connect` on any other connection failure.
    pub async fn connect(&self) -> Result<RedisHandle, DatastoreError> {
        let client =
            redis::Client::open(self.config.url.as_str()).map_err(|e| {
                DatastoreError::Configuration {
                    backend: BACKEND,
                    message: e.to_string(),
                }
            })?;

        let connect_timeout = Duration::from_secs(self.config.connect_timeout_seconds);
        let connection = timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| DatastoreError::Timeout {
                backend: BACKEND,
                timeout_seconds: self.config.connect_timeout_seconds,
            })?
            .map_err(|e| DatastoreError::Connect {
                backend: BACKEND,
                message: e.to_string(),
            })?;

        info!(url = %self.config.url, "redis connected");
        Ok(RedisHandle { connection })
    }
}

/// Live Redis connection handle
#[derive(Clone)]
pub struct RedisHandle {
    connection: ConnectionManager,
}

impl RedisHandle {
    /// Clone out the underlying connection manager for issuing commands
    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    /// Disconnect. The manager has no explicit close; dropping the last
    /// clone releases the connection.
    pub async fn teardown(self) {
        debug!("redis connection released");
        drop(self.connection);
    }
}

impl fmt::Debug for RedisHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisHandle").finish_non_exhaustive()
    }
}

impl Datastore for RedisHandle {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn health_check(&self) -> Result<HealthStatus, DatastoreError> {
        let mut connection = self.connection.clone();
        match redis::cmd("PING")
            .query_async::<String>(&mut connection)
            .await
        {
            Ok(_) => Ok(HealthStatus::Up),
            Err(e) => Ok(HealthStatus::Down {
                reason: e.to_string(),
            }),
        }
    }
}
