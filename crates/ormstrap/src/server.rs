// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Server lifecycle module
//!
//! This module provides the strapper itself: classification of the caller's
//! modules, concurrent backend initialization, router assembly with the
//! cross-cutting middleware stack, and coordinated graceful shutdown using
//! `CancellationToken`.

use std::{fmt, net::SocketAddr, sync::Arc};

use axum::{Router, http::HeaderName};
use datastore_client::DatastoreError;
use datastores::{
    DatastoreRegistry, MongoConfig, MongoStore, MySqlConfig, MySqlStore, Ontology, PostgresConfig,
    PostgresStore, RedisConfig, RedisStore,
};
use hyper::Request;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};

use crate::{
    config::{DatastoresConfig, StrapConfig},
    error::{StrapError, StrapResult},
    modules::{AppModules, ClassifiedModels, EnabledBackends, MountedRoutes, classify},
    routes::{create_routes, version_paths},
    state::ServerState,
};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Hook fired once after the listener is bound, with the bound address and
/// the live ontology
pub type StartHook = Box<dyn FnOnce(SocketAddr, &Ontology) + Send>;

/// The strapper: one configuration object plus the caller's modules,
/// consumed to produce a ready-to-run server
pub struct Strapper {
    config: StrapConfig,
    modules: AppModules,
    on_server_start: Option<StartHook>,
}

impl fmt::Debug for Strapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strapper")
            .field("config", &self.config)
            .field("modules", &self.modules)
            .field("on_server_start", &self.on_server_start.is_some())
            .finish()
    }
}

impl Strapper {
    /// Create a new strapper from configuration and caller modules
    pub fn new(config: StrapConfig, modules: AppModules) -> Self {
        Self {
            config,
            modules,
            on_server_start: None,
        }
    }

    /// Install a hook fired once after the listener is bound
    #[must_use]
    pub fn on_server_start(
        mut self,
        hook: impl FnOnce(SocketAddr, &Ontology) + Send + 'static,
    ) -> Self {
        self.on_server_start = Some(Box::new(hook));
        self
    }

    /// Wire everything up: classify modules, initialize every enabled backend
    /// concurrently, and assemble the router
    ///
    /// Completes exactly once per run: `Ok` with the strapped server after
    /// every backend came up, or `Err` carrying the first failure. No socket
    /// is bound here; callers honoring `skip_start` simply never call
    /// [`Strapped::run`].
    ///
    /// # Errors
    ///
    /// Returns `StrapError::Config` for an invalid root prefix and
    /// `StrapError::Datastore` for the first backend initialization failure.
    pub async fn strap(self) -> StrapResult<Strapped> {
        if !self.config.root.starts_with('/') {
            return Err(StrapError::Config {
                message: format!("root prefix must start with '/': {}", self.config.root),
            });
        }

        let enabled = EnabledBackends {
            postgres: !self.config.datastores.postgres.skip,
            mysql: !self.config.datastores.mysql.skip,
            mongo: !self.config.datastores.mongo.skip,
        };
        let (mounted, classified) = classify(
            &self.modules,
            &self.config.root,
            enabled,
            &self.config.omit_models,
        );

        if !self.config.skip_version_routes {
            let reserved = version_paths(&self.config.root);
            if reserved.contains("/health") {
                return Err(StrapError::Config {
                    message: format!(
                        "root prefix collides with the health route: {}",
                        self.config.root
                    ),
                });
            }
            if let Some((namespace, _)) = mounted.iter().find(|(ns, _)| reserved.contains(ns)) {
                return Err(StrapError::Config {
                    message: format!(
                        "route group namespace collides with a version route: {namespace}"
                    ),
                });
            }
        }

        let registry = build_registry(&self.config.datastores, &classified)?;
        let ontology = registry.initialize().await?;

        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(
            self.config.clone(),
            Arc::new(ontology),
            cancellation_token.child_token(),
        );
        let router = build_router(state.clone(), mounted, &self.config);

        Ok(Strapped {
            config: self.config,
            router,
            state,
            cancellation_token,
            on_server_start: self.on_server_start,
        })
    }
}

/// A fully wired server: routes mounted, backends live, not yet listening
pub struct Strapped {
    config: StrapConfig,
    router: Router,
    state: ServerState,
    cancellation_token: CancellationToken,
    on_server_start: Option<StartHook>,
}

impl fmt::Debug for Strapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strapped")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Strapped {
    /// Strapper configuration
    pub fn config(&self) -> &StrapConfig {
        &self.config
    }

    /// Shared server state
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// The ontology of live backend handles
    pub fn ontology(&self) -> &Ontology {
        self.state.ontology()
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the server's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Bind the configured address and serve until shutdown, then tear down
    /// every live backend
    ///
    /// # Errors
    ///
    /// Returns `StrapError::Bind` if unable to bind the configured address,
    /// `StrapError::Startup` if the listener address cannot be read, or
    /// `StrapError::Shutdown` if serving fails.
    pub async fn run(self) -> StrapResult<()> {
        let Self {
            config,
            router,
            state,
            cancellation_token,
            on_server_start,
        } = self;

        let addr = config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| StrapError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| StrapError::Startup { source })?;

        info!(
            app = %config.app_name,
            address = %actual_addr,
            environment = %config.environment,
            backends = ?state.ontology().backend_names(),
            "server listening",
        );

        if let Some(hook) = on_server_start {
            hook(actual_addr, state.ontology());
        }

        let shutdown_token = cancellation_token.clone();
        tokio::spawn(async move {
            shutdown_signal_handler(shutdown_token).await;
        });

        let serve_token = cancellation_token.clone();
        let server_result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                serve_token.cancelled().await;
                info!("server shut down gracefully");
            })
            .await;

        // Connections are released whether serving ended cleanly or not.
        state.ontology().as_ref().clone().teardown().await;

        if let Err(e) = server_result {
            error!(error = ?e, "server error during shutdown");
            Err(StrapError::Shutdown { source: e })
        } else {
            Ok(())
        }
    }

    /// Run server for testing, returns the bound address
    ///
    /// # Errors
    ///
    /// Returns `StrapError::Bind` if unable to bind the configured address.
    pub async fn run_for_testing(self) -> StrapResult<(SocketAddr, CancellationToken)> {
        let addr = self.config.socket_addr();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| StrapError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| StrapError::Startup { source })?;

        let token = self.cancellation_token.child_token();
        let task = token.child_token();
        tokio::spawn(async move {
            let _ = axum::serve(listener, self.router)
                .with_graceful_shutdown(async move { task.cancelled().await })
                .await;
        });

        Ok((actual_addr, token))
    }

    /// Release every live backend without ever binding a socket
    ///
    /// This is the `skip_start` path: the caller got the strapped result and
    /// is done with it.
    pub async fn teardown(self) {
        self.state.ontology().as_ref().clone().teardown().await;
    }
}

/// Build the adapter registry from the skip flags and classified model buckets
fn build_registry(
    config: &DatastoresConfig,
    models: &ClassifiedModels,
) -> Result<DatastoreRegistry, DatastoreError> {
    let redis = if config.redis.skip {
        None
    } else {
        let url = config
            .redis
            .resolved_url("REDIS_URL")
            .unwrap_or_else(|| RedisConfig::default().url);
        Some(RedisStore::new(RedisConfig {
            url,
            connect_timeout_seconds: config.redis.connect_timeout_seconds,
        })?)
    };

    let postgres = if config.postgres.skip {
        None
    } else {
        let url = config
            .postgres
            .resolved_url("DATABASE_URL")
            .unwrap_or_default();
        Some(PostgresStore::new(
            PostgresConfig {
                url,
                max_connections: config.postgres.max_connections,
                acquire_timeout_seconds: config.postgres.connect_timeout_seconds,
            },
            models.postgres_entities.clone(),
        )?)
    };

    let mysql = if config.mysql.skip {
        None
    } else {
        let url = config.mysql.resolved_url("MYSQL_URL").unwrap_or_default();
        Some(MySqlStore::new(
            MySqlConfig {
                url,
                max_connections: config.mysql.max_connections,
                acquire_timeout_seconds: config.mysql.connect_timeout_seconds,
            },
            models.mysql_tables.clone(),
        )?)
    };

    let mongo = if config.mongo.skip {
        None
    } else {
        let url = config.mongo.resolved_url("MONGODB_URL").unwrap_or_default();
        Some(MongoStore::new(
            MongoConfig {
                url,
                database: config.mongo.database.clone().unwrap_or_default(),
                connect_timeout_seconds: config.mongo.connect_timeout_seconds,
            },
            models.mongo_collections.clone(),
        )?)
    };

    Ok(DatastoreRegistry::with_stores(redis, postgres, mysql, mongo))
}

/// Assemble the application router: built-in routes, caller route groups
/// nested at their namespaces, and the middleware stack
fn build_router(state: ServerState, mounted: MountedRoutes, config: &StrapConfig) -> Router {
    let mut app = create_routes(config);
    for (namespace, group) in mounted {
        app = app.nest(&namespace, group);
    }

    let timeout_duration = config.timeout_seconds.value();

    let app = if config.skip_request_logging {
        app.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(timeout_duration)),
        )
    } else {
        app.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                        if let Some(request_id) = req.headers().get(REQUEST_ID_HEADER) {
                            info_span!("http_request", ?request_id)
                        } else {
                            tracing::error!("failed to extract id from request");
                            info_span!("http_request", request_id = "unknown")
                        }
                    }),
                )
                .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(timeout_duration)),
        )
    };

    app.with_state(state)
}

/// Handle shutdown signals and trigger coordinated cancellation
///
/// Listens for SIGINT (Ctrl+C) and SIGTERM signals, and cancels the provided
/// cancellation token when received.
async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
    let signal_received = async {
        #[cfg(unix)]
        #[allow(clippy::expect_used)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm =
                signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
            let mut sigint =
                signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

            tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            }
        }

        #[cfg(not(unix))]
        #[allow(clippy::expect_used)]
        {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install CTRL+C signal handler");
            "CTRL+C"
        }
    };

    tokio::select! {
        signal_name = signal_received => {
            warn!("shutdown signal {} received, cancelling all operations", signal_name);
            cancellation_token.cancel();
        },
        () = cancellation_token.cancelled() => {
            warn!("cancellation token already cancelled, signal handler exiting");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Environment, modules::RouteGroup};

    #[tokio::test]
    async fn strap_with_everything_skipped() -> StrapResult<()> {
        let config = StrapConfig::for_testing();
        let strapped = Strapper::new(config, AppModules::new()).strap().await?;

        assert_eq!(strapped.config().environment, Environment::Testing);
        assert!(strapped.ontology().is_empty());
        assert!(!strapped.cancellation_token().is_cancelled());

        strapped.teardown().await;
        Ok(())
    }

    #[tokio::test]
    async fn programmatic_shutdown() -> StrapResult<()> {
        let config = StrapConfig::for_testing();
        let strapped = Strapper::new(config, AppModules::new()).strap().await?;

        assert!(!strapped.cancellation_token().is_cancelled());

        strapped.shutdown();

        assert!(strapped.cancellation_token().is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn server_root_straps_with_version_routes_enabled() -> StrapResult<()> {
        let mut config = StrapConfig::for_testing();
        config.root = "/".to_string();
        config.skip_version_routes = false;

        let strapped = Strapper::new(config, AppModules::new()).strap().await?;
        strapped.teardown().await;
        Ok(())
    }

    #[tokio::test]
    async fn group_namespace_colliding_with_a_version_route_is_rejected() {
        let mut config = StrapConfig::for_testing();
        config.skip_version_routes = false;

        let modules = AppModules::new().routes("version", RouteGroup::new());
        let result = Strapper::new(config, modules).strap().await;
        assert!(matches!(result, Err(StrapError::Config { .. })));
    }

    #[tokio::test]
    async fn root_colliding_with_the_health_route_is_rejected() {
        let mut config = StrapConfig::for_testing();
        config.root = "/health".to_string();
        config.skip_version_routes = false;

        let result = Strapper::new(config, AppModules::new()).strap().await;
        assert!(matches!(result, Err(StrapError::Config { .. })));
    }

    #[tokio::test]
    async fn root_without_leading_slash_is_rejected() {
        let mut config = StrapConfig::for_testing();
        config.root = "api".to_string();

        let result = Strapper::new(config, AppModules::new()).strap().await;
        assert!(matches!(result, Err(StrapError::Config { .. })));
    }

    #[test]
    fn registry_build_honors_skip_flags() {
        let config = DatastoresConfig::default();
        let registry = build_registry(&config, &ClassifiedModels::default())
            .expect("all-skipped build cannot fail");
        assert_eq!(registry.backend_count(), 0);
    }
}
