// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Generic datastore traits and utilities for backend integrations
//!
//! This crate provides the common abstractions shared by every datastore
//! backend the strapper can wire up.
//!
//! # Core Abstractions
//!
//! - **`Datastore` Trait**: Common interface for live backend handles with async health checks
//! - **Health Check System**: Standardized health status reporting across all backends
//! - **Error Handling**: One `DatastoreError` type covering configuration, connection,
//!   and malformed-result failures
//!
//! # Key Features
//!
//! - **Async-First Design**: Health checks return `impl Future` for efficient async execution
//! - **Uniform Failure Surface**: Every backend reports through the same error enum, so the
//!   orchestration join can short-circuit on the first failure regardless of which backend it
//!   came from
//! - **Type Safety**: Skipped backends are represented as absent handles, never as stub values

use thiserror::Error;

pub mod health;

pub use health::*;

/// Generic trait for live datastore handles
///
/// Implemented by each backend's connection handle, enabling uniform
/// health aggregation over heterogeneous connections.
pub trait Datastore: Send + Sync {
    /// Get the name/identifier of this datastore backend
    fn name(&self) -> &'static str;

    /// Check the health of this datastore connection
    ///
    /// # Errors
    ///
    /// Returns an error if the probe query cannot be issued at all; a probe
    /// that runs but reports an unhealthy backend resolves to
    /// `HealthStatus::Down` instead.
    fn health_check(&self) -> impl Future<Output = Result<HealthStatus, DatastoreError>> + Send;
}

/// Common errors that can occur when working with datastore backends
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum DatastoreError {
    /// Configuration is missing or invalid for an enabled backend
    #[error("{backend} configuration error: {message}")]
    Configuration {
        backend: &'static str,
        message: String,
    },

    /// Opening the connection or pool failed
    #[error("{backend} connection failed: {message}")]
    Connect {
        backend: &'static str,
        message: String,
    },

    /// A query or command against a live connection failed
    #[error("{backend} query failed: {message}")]
    Query {
        backend: &'static str,
        message: String,
    },

    /// The backend initialized but produced an empty connection/collection set
    #[error("{backend} initialized with an empty ontology")]
    EmptyOntology { backend: &'static str },

    /// Operation exceeded its connect timeout
    #[error("{backend} timed out after {timeout_seconds} seconds")]
    Timeout {
        backend: &'static str,
        timeout_seconds: u64,
    },

    /// Backend independent error
    #[error(transparent)]
    Custom { error: anyhow::Error },
}

impl DatastoreError {
    /// Name of the backend this error originated from, if known
    pub fn backend(&self) -> Option<&'static str> {
        match self {
            Self::Configuration { backend, .. }
            | Self::Connect { backend, .. }
            | Self::Query { backend, .. }
            | Self::EmptyOntology { backend }
            | Self::Timeout { backend, .. } => Some(backend),
            Self::Custom { .. } => None,
        }
    }

    /// True when the error means the backend never produced a usable handle
    pub fn is_fatal_at_startup(&self) -> bool {
        !matches!(self, Self::Query { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let error = DatastoreError::Connect {
            backend: "redis",
            message: "refused".to_string(),
        };
        assert_eq!(error.to_string(), "redis connection failed: refused");

        let error = DatastoreError::EmptyOntology { backend: "mongo" };
        assert_eq!(error.to_string(), "mongo initialized with an empty ontology");
    }

    #[test]
    fn error_backend_attribution() {
        let error = DatastoreError::Configuration {
            backend: "postgres",
            message: "no url".to_string(),
        };
        assert_eq!(error.backend(), Some("postgres"));

        let error = DatastoreError::Custom {
            error: anyhow::Error::msg("opaque"),
        };
        assert_eq!(error.backend(), None);
    }

    #[test]
    fn startup_fatality() {
        assert!(
            DatastoreError::Connect {
                backend: "mysql",
                message: "down".to_string(),
            }
            .is_fatal_at_startup()
        );
        assert!(
            !DatastoreError::Query {
                backend: "mysql",
                message: "syntax".to_string(),
            }
            .is_fatal_at_startup()
        );
    }
}
