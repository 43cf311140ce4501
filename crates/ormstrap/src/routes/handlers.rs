// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers for the built-in routes

use axum::{Json, extract::State};

use crate::state::{HealthCheck, ServerState};

/// Health check endpoint handler
pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthCheck> {
    Json(state.health_check().await)
}

/// Version info endpoint handler
///
/// Returns the configured version string unchanged.
pub async fn version_handler(State(state): State<ServerState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "version": state.config().version }))
}
