// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

//! Celula-Sync: offline write-buffer and sync engine for cell-meeting reports.
//!
//! Leaders record weekly attendance and offering data on devices that may
//! lose connectivity mid-entry. This crate captures each report into a
//! durable local outbox the moment it is filled in, then replays pending
//! reports to the backend once connectivity returns, removing each entry
//! only after the remote side confirms it. Delivery is at-least-once with
//! remote deduplication keyed by the client-generated submission id.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::OutboxStore;
use error::StoreError;
use services::{ConnectivityGate, RemoteSubmit, SyncEngine};

/// Shared wiring for one tenant's sync subsystem.
pub struct SyncContext {
    pub config: Config,
    pub store: OutboxStore,
    pub gate: Arc<ConnectivityGate>,
    pub engine: Arc<SyncEngine>,
}

impl SyncContext {
    /// Open the store at the configured path and wire the engine to the
    /// given remote submission operation. The gate starts offline until the
    /// platform connectivity signal reports in.
    pub fn new(config: Config, remote: Arc<dyn RemoteSubmit>) -> Result<Self, StoreError> {
        let store = OutboxStore::open(&config.store_path)?;
        let gate = Arc::new(ConnectivityGate::unknown());
        let engine = Arc::new(SyncEngine::with_retry_policy(
            store.clone(),
            remote,
            Arc::clone(&gate),
            config.retry_policy(),
        ));

        Ok(Self {
            config,
            store,
            gate,
            engine,
        })
    }
}
