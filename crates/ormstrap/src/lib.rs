// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Framework strapper: one configuration object wiring an HTTP server and
//! up to four optional datastore backends
//!
//! Callers hand over their route groups and model definitions plus a single
//! [`StrapConfig`]; the strapper classifies the modules, brings every enabled
//! backend up concurrently with fail-fast semantics, and returns a ready
//! Axum server together with the [`Ontology`](datastores::Ontology) of live
//! backend handles.
//!
//! # Module Structure
//!
//! - [`config`]: Strapper configuration and environment management with hierarchical loading
//! - [`error`]: Error types and HTTP response handling with proper status codes
//! - [`modules`]: Caller-supplied route groups and model definitions plus the classifier
//! - [`state`]: Shared application state with cancellation token support
//! - [`server`]: Strapper and server lifecycle with coordinated shutdown
//! - [`routes`]: Built-in health and version routes
//!
//! # Example
//!
//! ```no_run
//! use ormstrap::{AppModules, StrapConfig, Strapper};
//!
//! # async fn demo() -> ormstrap::StrapResult<()> {
//! let config = StrapConfig::from_env()?;
//! let strapped = Strapper::new(config, AppModules::new()).strap().await?;
//! if strapped.config().skip_start {
//!     strapped.teardown().await;
//! } else {
//!     strapped.run().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod modules;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, StrapConfig};
pub use error::{StrapError, StrapResult};
pub use modules::{AppModules, ModelDef, ModelTarget, ModuleDef, RouteGroup};
pub use server::{Strapped, Strapper};
pub use state::ServerState;
