// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

//! Celula-Sync outbox utility.
//!
//! Operational companion to the embedded engine: opens the configured
//! outbox store, reports how many meeting reports are waiting, and performs
//! one drain pass against the configured backend. Useful for flushing a
//! device's outbox by hand and for smoke-testing backend connectivity.

use std::sync::Arc;

use anyhow::Context;
use celula_sync::{
    config::Config,
    services::{HttpRemote, RemoteSubmit},
    SyncContext,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        store = %config.store_path.display(),
        backend = %config.backend_url,
        "Starting outbox drain"
    );

    let remote: Arc<dyn RemoteSubmit> = Arc::new(HttpRemote::with_timeout(
        config.backend_url.clone(),
        config.backend_api_token.clone(),
        config.submit_timeout,
    ));

    let ctx = SyncContext::new(config, remote).context("Failed to open outbox store")?;

    let pending = ctx.store.pending_count();
    tracing::info!(pending, "Outbox opened");
    if pending == 0 {
        return Ok(());
    }

    // This tool is only ever run with a network in hand, so the gate is
    // opened unconditionally; a wrong guess just means failed submissions
    // stay pending, same as on-device.
    ctx.gate.set_online(true);

    let report = ctx.engine.drain().await?;
    tracing::info!(
        delivered = report.delivered(),
        failed = report.failed(),
        remaining = ctx.store.pending_count(),
        "Drain finished"
    );

    if report.failed() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("celula_sync=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
