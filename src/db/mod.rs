// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

//! Durable local storage layer (sled).

pub mod outbox;

pub use outbox::OutboxStore;

/// Tree names as constants.
pub mod trees {
    pub const PENDING_SUBMISSIONS: &str = "pending_submissions";
}
