// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! ormstrap server
//!
//! Straps a bare server from configuration alone: no caller modules, only
//! the built-in health and version surface plus whichever backends the
//! configuration enables.

use anyhow::Result;
use ormstrap::{AppModules, StrapConfig, Strapper};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StrapConfig::from_env()?;

    info!(app = %config.app_name, "strapping server");

    let strapped = Strapper::new(config, AppModules::new()).strap().await?;

    if strapped.config().skip_start {
        info!("skip_start set, releasing backends without serving");
        strapped.teardown().await;
        return Ok(());
    }

    // NOTE: the `#[tokio::main]` task does not run a worker future, we must spawn
    tokio::spawn(async move { strapped.run().await }).await??;

    Ok(())
}
