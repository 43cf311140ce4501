// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Module registry and classifier
//!
//! Callers hand the strapper an [`AppModules`] bundle: an ordered map from
//! group name to either a set of route registrars or a list of tagged model
//! definitions. Classification is synchronous and happens before any backend
//! I/O: route groups are mounted immediately under `root + '/' + group`, and
//! models are partitioned into per-backend buckets. Models naming a skipped
//! backend (or listed in `omit_models`) are never fatal; they are logged and
//! collected in the unclassified bucket.

use std::{
    collections::BTreeMap,
    fmt,
};

use axum::Router;
use tracing::{info, warn};

use crate::state::ServerState;

/// A callable that builds the routes for one namespace
///
/// Invoked exactly once per strap with the namespace the returned router will
/// be nested under.
pub type RouteRegistrar = Box<dyn Fn(&str) -> Router<ServerState> + Send + Sync>;

/// Named route registrars belonging to one group
#[derive(Default)]
pub struct RouteGroup {
    registrars: Vec<(String, RouteRegistrar)>,
}

impl RouteGroup {
    /// Create an empty route group
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named registrar to the group
    #[must_use]
    pub fn register(
        mut self,
        name: impl Into<String>,
        registrar: impl Fn(&str) -> Router<ServerState> + Send + Sync + 'static,
    ) -> Self {
        self.registrars.push((name.into(), Box::new(registrar)));
        self
    }

    /// Number of registrars in the group
    pub fn len(&self) -> usize {
        self.registrars.len()
    }

    /// True when the group has no registrars
    pub fn is_empty(&self) -> bool {
        self.registrars.is_empty()
    }
}

impl fmt::Debug for RouteGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.registrars.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("RouteGroup").field("registrars", &names).finish()
    }
}

/// Backend a model definition is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelTarget {
    /// Document store collection
    Mongo {
        /// Collection name
        collection: String,
    },
    /// PostgreSQL table
    Postgres {
        /// Table name
        table: String,
    },
    /// MySQL table
    MySql {
        /// Table name
        table: String,
    },
}

impl ModelTarget {
    fn backend(&self) -> &'static str {
        match self {
            Self::Mongo { .. } => "mongo",
            Self::Postgres { .. } => "postgres",
            Self::MySql { .. } => "mysql",
        }
    }
}

/// One named model definition, explicitly tagged with its backend
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// Model name
    pub name: String,
    /// Backend binding
    pub target: ModelTarget,
}

impl ModelDef {
    /// Convenience constructor
    pub fn new(name: impl Into<String>, target: ModelTarget) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

/// One registry entry: either a route group or a list of model definitions
pub enum ModuleDef {
    /// Route registrars mounted under the group namespace
    Routes(RouteGroup),
    /// Model definitions partitioned into backend buckets
    Models(Vec<ModelDef>),
}

impl fmt::Debug for ModuleDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Routes(group) => f.debug_tuple("Routes").field(group).finish(),
            Self::Models(models) => f.debug_tuple("Models").field(models).finish(),
        }
    }
}

/// Ordered registry of caller-supplied modules, keyed by group name
#[derive(Debug, Default)]
pub struct AppModules {
    entries: BTreeMap<String, ModuleDef>,
}

impl AppModules {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route group under the given name
    #[must_use]
    pub fn routes(mut self, group: impl Into<String>, routes: RouteGroup) -> Self {
        self.entries.insert(group.into(), ModuleDef::Routes(routes));
        self
    }

    /// Add model definitions under the given name
    #[must_use]
    pub fn models(mut self, group: impl Into<String>, models: Vec<ModelDef>) -> Self {
        self.entries.insert(group.into(), ModuleDef::Models(models));
        self
    }

    /// Number of registry entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no modules are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which model backends are enabled, derived from the skip flags
#[derive(Debug, Clone, Copy, Default)]
pub struct EnabledBackends {
    /// PostgreSQL enabled
    pub postgres: bool,
    /// MySQL enabled
    pub mysql: bool,
    /// MongoDB enabled
    pub mongo: bool,
}

/// Per-backend model buckets produced by classification
#[derive(Debug, Clone, Default)]
pub struct ClassifiedModels {
    /// Document collection names
    pub mongo_collections: Vec<String>,
    /// Model name to table name
    pub postgres_entities: BTreeMap<String, String>,
    /// MySQL table names
    pub mysql_tables: Vec<String>,
    /// Names of models that could not be placed in any enabled bucket
    pub unclassified: Vec<String>,
}

/// Routers produced by route registrars, paired with their namespace
pub type MountedRoutes = Vec<(String, Router<ServerState>)>;

/// Partition the registry into mounted routers and per-backend model buckets
///
/// Every route registrar is invoked exactly once, receiving the namespace
/// `root + '/' + group`. Models in `omit_models` or bound to a disabled
/// backend land in the unclassified bucket with a warning.
pub fn classify(
    modules: &AppModules,
    root: &str,
    enabled: EnabledBackends,
    omit_models: &[String],
) -> (MountedRoutes, ClassifiedModels) {
    let mut mounted = MountedRoutes::new();
    let mut classified = ClassifiedModels::default();
    let mut route_groups = Vec::new();

    for (group, def) in &modules.entries {
        match def {
            ModuleDef::Routes(route_group) => {
                let namespace = format!("{root}/{group}");
                let mut router = Router::new();
                for (_, registrar) in &route_group.registrars {
                    router = router.merge(registrar(&namespace));
                }
                route_groups.push(group.as_str());
                mounted.push((namespace, router));
            }
            ModuleDef::Models(models) => {
                for model in models {
                    classify_model(model, enabled, omit_models, &mut classified);
                }
            }
        }
    }

    info!(groups = ?route_groups, "registered route groups");
    if !classified.unclassified.is_empty() {
        warn!(models = ?classified.unclassified, "failed classifying models");
    }

    (mounted, classified)
}

fn classify_model(
    model: &ModelDef,
    enabled: EnabledBackends,
    omit_models: &[String],
    classified: &mut ClassifiedModels,
) {
    if omit_models.contains(&model.name) {
        classified.unclassified.push(model.name.clone());
        return;
    }

    match &model.target {
        ModelTarget::Mongo { collection } if enabled.mongo => {
            classified.mongo_collections.push(collection.clone());
        }
        ModelTarget::Postgres { table } if enabled.postgres => {
            classified
                .postgres_entities
                .insert(model.name.clone(), table.clone());
        }
        ModelTarget::MySql { table } if enabled.mysql => {
            classified.mysql_tables.push(table.clone());
        }
        target => {
            warn!(
                model = %model.name,
                backend = target.backend(),
                "model targets a skipped backend"
            );
            classified.unclassified.push(model.name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn all_enabled() -> EnabledBackends {
        EnabledBackends {
            postgres: true,
            mysql: true,
            mongo: true,
        }
    }

    #[test]
    fn models_partition_into_their_buckets() {
        let modules = AppModules::new().models(
            "models",
            vec![
                ModelDef::new(
                    "User",
                    ModelTarget::Postgres {
                        table: "users".to_string(),
                    },
                ),
                ModelDef::new(
                    "Event",
                    ModelTarget::Mongo {
                        collection: "events".to_string(),
                    },
                ),
                ModelDef::new(
                    "AuditRow",
                    ModelTarget::MySql {
                        table: "audit".to_string(),
                    },
                ),
            ],
        );

        let (mounted, classified) = classify(&modules, "/api", all_enabled(), &[]);

        assert!(mounted.is_empty());
        assert_eq!(classified.mongo_collections, vec!["events".to_string()]);
        assert_eq!(
            classified.postgres_entities.get("User").map(String::as_str),
            Some("users")
        );
        assert_eq!(classified.mysql_tables, vec!["audit".to_string()]);
        assert!(classified.unclassified.is_empty());
    }

    #[test]
    fn disabled_backend_models_are_unclassified_not_fatal() {
        let modules = AppModules::new().models(
            "models",
            vec![ModelDef::new(
                "Event",
                ModelTarget::Mongo {
                    collection: "events".to_string(),
                },
            )],
        );

        let (_, classified) = classify(&modules, "/api", EnabledBackends::default(), &[]);

        assert!(classified.mongo_collections.is_empty());
        assert_eq!(classified.unclassified, vec!["Event".to_string()]);
    }

    #[test]
    fn omitted_models_are_filtered_before_bucketing() {
        let modules = AppModules::new().models(
            "models",
            vec![ModelDef::new(
                "AccessToken",
                ModelTarget::Postgres {
                    table: "access_tokens".to_string(),
                },
            )],
        );

        let omit = vec!["AccessToken".to_string()];
        let (_, classified) = classify(&modules, "/api", all_enabled(), &omit);

        assert!(classified.postgres_entities.is_empty());
        assert_eq!(classified.unclassified, vec!["AccessToken".to_string()]);
    }

    #[test]
    fn registrars_run_exactly_once_with_the_group_namespace() {
        let calls = Arc::new(AtomicUsize::new(0));
        let namespaces = Arc::new(Mutex::new(Vec::new()));

        let calls_in = calls.clone();
        let namespaces_in = namespaces.clone();
        let group = RouteGroup::new().register("crud", move |namespace: &str| {
            calls_in.fetch_add(1, Ordering::SeqCst);
            namespaces_in
                .lock()
                .expect("lock poisoned")
                .push(namespace.to_string());
            Router::new()
        });

        let modules = AppModules::new().routes("user", group);
        let (mounted, _) = classify(&modules, "/api", EnabledBackends::default(), &[]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(mounted.len(), 1);
        assert_eq!(mounted[0].0, "/api/user");
        assert_eq!(
            *namespaces.lock().expect("lock poisoned"),
            vec!["/api/user".to_string()]
        );
    }

    #[test]
    fn groups_mount_in_deterministic_order() {
        let modules = AppModules::new()
            .routes("zebra", RouteGroup::new())
            .routes("alpha", RouteGroup::new());

        let (mounted, _) = classify(&modules, "/api", EnabledBackends::default(), &[]);
        let namespaces: Vec<&str> = mounted.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(namespaces, vec!["/api/alpha", "/api/zebra"]);
    }
}
