// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! Built-in routes the strapper installs before any caller route group:
//! a `/health` endpoint aggregating backend health, and (unless skipped)
//! the informational version routes at `/`, `/version`, `{root}` and
//! `{root}/version`.

pub mod handlers;

use std::collections::BTreeSet;

use axum::{Router, routing::get};
use handlers::{health_handler, version_handler};

use crate::{config::StrapConfig, state::ServerState};

/// Create the built-in routes for the given configuration
pub fn create_routes(config: &StrapConfig) -> Router<ServerState> {
    let mut router = Router::new().route("/health", get(health_handler));

    if !config.skip_version_routes {
        for path in version_paths(&config.root) {
            router = router.route(&path, get(version_handler));
        }
    }

    router
}

/// The informational paths, anchored at both the server root and the
/// configured route prefix
///
/// Deduplicated, so overlapping roots such as `/` or `/version` register
/// each path exactly once.
pub(crate) fn version_paths(root: &str) -> BTreeSet<String> {
    let base = root.trim_end_matches('/');

    let mut paths = BTreeSet::from(["/".to_string(), "/version".to_string()]);
    if !base.is_empty() {
        paths.insert(base.to_string());
    }
    paths.insert(format!("{base}/version"));
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_vec(paths: BTreeSet<String>) -> Vec<String> {
        paths.into_iter().collect()
    }

    #[test]
    fn version_paths_follow_the_root_prefix() {
        assert_eq!(
            as_vec(version_paths("/api")),
            vec![
                "/".to_string(),
                "/api".to_string(),
                "/api/version".to_string(),
                "/version".to_string(),
            ]
        );
    }

    #[test]
    fn version_paths_deduplicate_overlapping_roots() {
        assert_eq!(
            as_vec(version_paths("/")),
            vec!["/".to_string(), "/version".to_string()]
        );
        assert_eq!(
            as_vec(version_paths("/version")),
            vec![
                "/".to_string(),
                "/version".to_string(),
                "/version/version".to_string(),
            ]
        );
    }

    #[test]
    fn version_routes_at_the_server_root_register_once() {
        let mut config = StrapConfig::for_testing();
        config.root = "/".to_string();
        config.skip_version_routes = false;

        // Route registration panics on a duplicate path; building the router
        // is the assertion.
        let _router = create_routes(&config);
    }
}
