// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Datastore registry: concurrent initialization, health aggregation, teardown
//!
//! The registry holds one optional adapter slot per supported backend. A
//! skipped backend occupies an empty slot and resolves immediately with no
//! handle and no error; everything else is initialized concurrently with
//! fail-fast semantics, producing the immutable [`Ontology`] bundle.

use std::collections::HashMap;

use datastore_client::{Datastore, DatastoreError, HealthStatus};
use tracing::{debug, info};

use crate::{
    mongo::{MongoHandle, MongoStore},
    mysql::{MySqlHandle, MySqlStore},
    postgres::{PostgresHandle, PostgresStore},
    redis::{RedisHandle, RedisStore},
};

/// Registry of configured datastore adapters awaiting initialization
#[derive(Debug, Default)]
pub struct DatastoreRegistry {
    redis: Option<RedisStore>,
    postgres: Option<PostgresStore>,
    mysql: Option<MySqlStore>,
    mongo: Option<MongoStore>,
}

impl DatastoreRegistry {
    /// Create a new empty registry (every backend skipped)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the specified adapters; `None` means skipped
    pub fn with_stores(
        redis: Option<RedisStore>,
        postgres: Option<PostgresStore>,
        mysql: Option<MySqlStore>,
        mongo: Option<MongoStore>,
    ) -> Self {
        Self {
            redis,
            postgres,
            mysql,
            mongo,
        }
    }

    /// Get the number of configured backends
    pub fn backend_count(&self) -> usize {
        usize::from(self.redis.is_some())
            + usize::from(self.postgres.is_some())
            + usize::from(self.mysql.is_some())
            + usize::from(self.mongo.is_some())
    }

    /// Get the names of all configured backends
    pub fn backend_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.redis.is_some() {
            names.push("redis");
        }
        if self.postgres.is_some() {
            names.push("postgres");
        }
        if self.mysql.is_some() {
            names.push("mysql");
        }
        if self.mongo.is_some() {
            names.push("mongo");
        }
        names
    }

    /// Initialize every configured backend concurrently
    ///
    /// The first failure short-circuits the join and is returned as the sole
    /// error; adapters still in flight finish on their own and their handles
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns the first `DatastoreError` produced by any adapter.
    pub async fn initialize(self) -> Result<Ontology, DatastoreError> {
        info!(backends = ?self.backend_names(), "initialising datastores");

        let (redis, postgres, mysql, mongo) = tokio::try_join!(
            async {
                match &self.redis {
                    None => Ok(None),
                    Some(store) => store.connect().await.map(Some),
                }
            },
            async {
                match &self.postgres {
                    None => Ok(None),
                    Some(store) => store.connect().await.map(Some),
                }
            },
            async {
                match &self.mysql {
                    None => Ok(None),
                    Some(store) => store.connect().await.map(Some),
                }
            },
            async {
                match &self.mongo {
                    None => Ok(None),
                    Some(store) => store.connect().await.map(Some),
                }
            },
        )?;

        Ok(Ontology {
            redis,
            postgres,
            mysql,
            mongo,
        })
    }
}

/// Immutable bundle of live backend handles produced by a successful
/// initialization; absent entries correspond to skipped backends
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    /// Redis connection, when enabled
    pub redis: Option<RedisHandle>,
    /// PostgreSQL pool plus derived entity map, when enabled
    pub postgres: Option<PostgresHandle>,
    /// MySQL pool, when enabled
    pub mysql: Option<MySqlHandle>,
    /// MongoDB client plus resolved collection set, when enabled
    pub mongo: Option<MongoHandle>,
}

impl Ontology {
    /// True when no backend produced a handle
    pub fn is_empty(&self) -> bool {
        self.redis.is_none()
            && self.postgres.is_none()
            && self.mysql.is_none()
            && self.mongo.is_none()
    }

    /// Names of the live backends
    pub fn backend_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.redis.is_some() {
            names.push("redis");
        }
        if self.postgres.is_some() {
            names.push("postgres");
        }
        if self.mysql.is_some() {
            names.push("mysql");
        }
        if self.mongo.is_some() {
            names.push("mongo");
        }
        names
    }

    /// Get the health of every live backend
    ///
    /// Health checks are performed concurrently; a probe error is reported as
    /// `Down` rather than propagated.
    pub async fn health(&self) -> HashMap<String, HealthStatus> {
        let redis_future = async {
            match &self.redis {
                None => None,
                Some(handle) => Some((handle.name().to_string(), probe(handle).await)),
            }
        };
        let postgres_future = async {
            match &self.postgres {
                None => None,
                Some(handle) => Some((handle.name().to_string(), probe(handle).await)),
            }
        };
        let mysql_future = async {
            match &self.mysql {
                None => None,
                Some(handle) => Some((handle.name().to_string(), probe(handle).await)),
            }
        };
        let mongo_future = async {
            match &self.mongo {
                None => None,
                Some(handle) => Some((handle.name().to_string(), probe(handle).await)),
            }
        };

        let (redis, postgres, mysql, mongo) =
            tokio::join!(redis_future, postgres_future, mysql_future, mongo_future);

        [redis, postgres, mysql, mongo]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Tear down every live backend concurrently
    ///
    /// Absent handles are no-ops; the call completes exactly once regardless
    /// of how many backends were live.
    pub async fn teardown(self) {
        debug!(backends = ?self.backend_names(), "tearing down datastores");

        let redis_future = async {
            if let Some(handle) = self.redis {
                handle.teardown().await;
            }
        };
        let postgres_future = async {
            if let Some(handle) = self.postgres {
                handle.teardown().await;
            }
        };
        let mysql_future = async {
            if let Some(handle) = self.mysql {
                handle.teardown().await;
            }
        };
        let mongo_future = async {
            if let Some(handle) = self.mongo {
                handle.teardown().await;
            }
        };

        tokio::join!(redis_future, postgres_future, mysql_future, mongo_future);
        info!("datastores torn down");
    }
}

async fn probe<D: Datastore>(datastore: &D) -> HealthStatus {
    match datastore.health_check().await {
        Ok(status) => status,
        Err(e) => HealthStatus::Down {
            reason: format!("health check failed: {e}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redis::RedisConfig;

    #[test]
    fn empty_registry_has_no_backends() {
        let registry = DatastoreRegistry::new();
        assert_eq!(registry.backend_count(), 0);
        assert!(registry.backend_names().is_empty());
    }

    #[tokio::test]
    async fn all_skipped_backends_initialize_to_an_empty_ontology() {
        let ontology = DatastoreRegistry::new()
            .initialize()
            .await
            .expect("empty registry must initialize cleanly");

        assert!(ontology.is_empty());
        assert!(ontology.redis.is_none());
        assert!(ontology.postgres.is_none());
        assert!(ontology.mysql.is_none());
        assert!(ontology.mongo.is_none());
    }

    #[tokio::test]
    async fn first_failure_is_the_sole_error() {
        let redis = RedisStore::new(RedisConfig {
            url: "definitely-not-a-redis-url".to_string(),
            ..RedisConfig::default()
        })
        .expect("non-empty url");

        let registry = DatastoreRegistry::with_stores(Some(redis), None, None, None);
        let result = registry.initialize().await;
        assert!(matches!(
            result,
            Err(DatastoreError::Configuration {
                backend: "redis",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn teardown_tolerates_absent_handles() {
        // All four slots empty; must complete without panicking or hanging.
        Ontology::default().teardown().await;
    }

    #[tokio::test]
    async fn empty_ontology_reports_no_health_entries() {
        let health = Ontology::default().health().await;
        assert!(health.is_empty());
    }
}
