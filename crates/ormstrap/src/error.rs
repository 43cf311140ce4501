// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides the error types for strapper operations, including the
//! HTTP translation layer that turns datastore and runtime failures into
//! uniform JSON error responses.

use std::net::SocketAddr;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use datastore_client::DatastoreError;
use thiserror::Error;

/// Comprehensive error types for strapper operations
#[derive(Error, Debug)]
pub enum StrapError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Backend initialization or probe failures
    #[error("Datastore error: {0}")]
    Datastore(#[from] DatastoreError),

    /// Runtime errors during server operation
    #[error("Runtime error: {message}")]
    Runtime {
        /// Error message
        message: String,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Result type for strapper operations
pub type StrapResult<T> = Result<T, StrapError>;

impl StrapError {
    /// HTTP status this error translates to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Datastore(DatastoreError::Query { .. } | DatastoreError::Timeout { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Datastore(_) | Self::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. }
            | Self::Runtime { .. }
            | Self::TaskJoin { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config_error",
            Self::Datastore(_) => "datastore_error",
            Self::Bind { .. } => "bind_error",
            Self::Startup { .. } => "startup_error",
            Self::Shutdown { .. } => "shutdown_error",
            Self::Runtime { .. } => "runtime_error",
            Self::TaskJoin { .. } => "task_join_error",
        }
    }
}

impl IntoResponse for StrapError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datastore_errors_map_to_http_statuses() {
        let error = StrapError::Datastore(DatastoreError::Query {
            backend: "postgres",
            message: "gone".to_string(),
        });
        assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let error = StrapError::Datastore(DatastoreError::EmptyOntology { backend: "mongo" });
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_display() {
        let error = StrapError::Config {
            message: "bad root".to_string(),
        };
        assert_eq!(error.to_string(), "Configuration error: bad root");
    }

    #[test]
    fn datastore_errors_convert_transparently() {
        let source = DatastoreError::Connect {
            backend: "redis",
            message: "refused".to_string(),
        };
        let error = StrapError::from(source);
        assert!(matches!(
            error,
            StrapError::Datastore(DatastoreError::Connect { backend: "redis", .. })
        ));
    }
}
