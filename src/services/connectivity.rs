// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

//! Connectivity gate: the engine's view of whether the backend is reachable.
//!
//! The gate is fed by whatever online/offline signal the host platform has;
//! it only records the current belief and notifies subscribers on
//! transitions. A false "offline" merely delays sync. A false "online" is
//! harmless: the resulting failed submission attempts take the ordinary
//! per-item retry path.

use tokio::sync::watch;

/// Current online/offline belief plus transition notifications.
///
/// When the state is unknown the gate is constructed offline; that is the
/// conservative reading, since drains while offline are skipped entirely.
pub struct ConnectivityGate {
    state: watch::Sender<bool>,
}

impl ConnectivityGate {
    /// Create a gate with a known initial state.
    pub fn new(initially_online: bool) -> Self {
        let (state, _) = watch::channel(initially_online);
        Self { state }
    }

    /// Create a gate that starts offline, for hosts whose connectivity
    /// signal has not reported yet.
    pub fn unknown() -> Self {
        Self::new(false)
    }

    /// Whether the backend is currently believed reachable.
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Record a platform connectivity event. Subscribers are only notified
    /// on actual transitions, not on repeated same-state reports.
    pub fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            tracing::info!(online, "Connectivity changed");
        }
    }

    /// Subscribe to transition events.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

impl Default for ConnectivityGate {
    fn default() -> Self {
        Self::unknown()
    }
}
