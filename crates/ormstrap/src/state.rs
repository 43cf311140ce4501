// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the strapped server:
//! configuration, the immutable ontology of live backend handles, and the
//! coordinated cancellation token.

use std::{collections::HashMap, sync::Arc};

use datastore_client::HealthStatus;
use datastores::Ontology;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::{Environment, StrapConfig};

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Strapper configuration
    config: StrapConfig,
    /// Live backend handles and derived metadata
    ontology: Arc<Ontology>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    pub fn new(
        config: StrapConfig,
        ontology: Arc<Ontology>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            ontology,
            cancellation_token,
        }
    }

    /// Strapper configuration
    pub fn config(&self) -> &StrapConfig {
        &self.config
    }

    /// The ontology of live backend handles
    pub fn ontology(&self) -> &Arc<Ontology> {
        &self.ontology
    }

    /// Perform health check operations across every live backend
    pub async fn health_check(&self) -> HealthCheck {
        let datastores = self.ontology.health().await;

        let mut down: Vec<&str> = datastores
            .iter()
            .filter(|(_, status)| status.is_down())
            .map(|(name, _)| name.as_str())
            .collect();
        down.sort_unstable();

        let status = if down.is_empty() {
            HealthStatus::Up
        } else {
            HealthStatus::Degraded {
                reason: format!("backends down: {}", down.join(", ")),
            }
        };

        HealthCheck {
            status,
            version: Box::from(self.config.version.as_str()),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            datastores,
        }
    }
}

/// Aggregated health check status
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall status
    pub status: HealthStatus,
    /// Configured version string
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Status of individual backends
    pub datastores: HashMap<String, HealthStatus>,
}
