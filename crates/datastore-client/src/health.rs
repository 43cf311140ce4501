// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Health check types and utilities for datastore backends

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health status of a datastore backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum HealthStatus {
    /// Backend is healthy and operational
    Up,
    /// Backend is degraded but still functional
    Degraded { reason: String },
    /// Backend is down and not functional
    Down { reason: String },
}

/// Detailed health check result with timing and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// The health status
    pub status: HealthStatus,
    /// Response time for the probe
    pub response_time: Duration,
    /// When the health check was performed
    pub timestamp: DateTime<Utc>,
    /// Optional additional details
    pub details: Option<String>,
}

impl HealthStatus {
    /// Check if this health status indicates the backend is usable
    pub fn is_available(&self) -> bool {
        matches!(self, HealthStatus::Up | HealthStatus::Degraded { .. })
    }

    /// Check if this health status indicates the backend is completely down
    pub fn is_down(&self) -> bool {
        matches!(self, HealthStatus::Down { .. })
    }

    /// Get a human-readable description of the status
    pub fn description(&self) -> &str {
        match self {
            HealthStatus::Up => "Backend is healthy",
            HealthStatus::Degraded { reason } | HealthStatus::Down { reason } => reason,
        }
    }
}

impl HealthCheckResult {
    /// Create a new successful health check result
    pub fn healthy(response_time: Duration) -> Self {
        Self {
            status: HealthStatus::Up,
            response_time,
            timestamp: Utc::now(),
            details: None,
        }
    }

    /// Create a new degraded health check result
    pub fn degraded(response_time: Duration, reason: String) -> Self {
        Self {
            status: HealthStatus::Degraded { reason },
            response_time,
            timestamp: Utc::now(),
            details: None,
        }
    }

    /// Create a new unhealthy health check result
    pub fn unhealthy(response_time: Duration, reason: String) -> Self {
        Self {
            status: HealthStatus::Down { reason },
            response_time,
            timestamp: Utc::now(),
            details: None,
        }
    }

    /// Add additional details to the health check result
    #[must_use]
    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_availability() {
        assert!(HealthStatus::Up.is_available());
        assert!(
            HealthStatus::Degraded {
                reason: "slow".to_string()
            }
            .is_available()
        );
        assert!(
            !HealthStatus::Down {
                reason: "offline".to_string()
            }
            .is_available()
        );
    }

    #[test]
    fn health_status_down_check() {
        assert!(!HealthStatus::Up.is_down());
        assert!(
            HealthStatus::Down {
                reason: "offline".to_string()
            }
            .is_down()
        );
    }

    #[test]
    fn health_check_result_creation() {
        let duration = Duration::from_millis(100);

        let healthy = HealthCheckResult::healthy(duration);
        assert!(healthy.status.is_available());
        assert_eq!(healthy.response_time, duration);

        let unhealthy = HealthCheckResult::unhealthy(duration, "connection failed".to_string());
        assert!(unhealthy.status.is_down());

        let detailed = HealthCheckResult::degraded(duration, "slow".to_string())
            .with_details("pool saturated".to_string());
        assert_eq!(detailed.details.as_deref(), Some("pool saturated"));
    }
}
