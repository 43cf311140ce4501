// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Datastore backend adapters for the strapper
//!
//! This crate provides the concrete backend integrations the strapper can wire
//! into an application, along with the registry that orchestrates their
//! initialization and teardown life cycles.
//!
//! # Architecture
//!
//! - **Adapters**: [`redis`], [`postgres`], [`mysql`], [`mongo`] - one connection or
//!   pool per backend for the process lifetime
//! - **Registry Pattern**: [`registry::DatastoreRegistry`] - runs all configured
//!   adapters concurrently and fails fast on the first error
//! - **Output Bundle**: [`registry::Ontology`] - the immutable set of live handles
//!   (plus derived entity/collection metadata) handed to the caller after startup
//!
//! # Features
//!
//! - **Skip Semantics**: a backend left unconfigured resolves to an absent handle
//!   with no error and no I/O
//! - **Concurrent Health Checks**: Uses `tokio::join!` for efficient health monitoring
//! - **Concurrent Teardown**: every live connection is closed idiomatically; absent
//!   handles are no-ops

pub mod mongo;
pub mod mysql;
pub mod postgres;
pub mod redis;
pub mod registry;

pub use self::mongo::*;
pub use self::mysql::*;
pub use self::postgres::*;
pub use self::redis::*;
pub use self::registry::*;
