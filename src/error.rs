// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

//! Error types for the offline outbox and sync engine.
//!
//! Three distinct failure domains:
//! - `StoreError`: local persistence failed. Fatal to capture; the caller
//!   must be told so the report is not silently lost.
//! - `SubmitError`: the remote side could not accept a submission. Always
//!   recoverable; the record stays pending and is retried on the next drain.
//! - `CaptureError`: the capture boundary rejected or failed to persist a
//!   draft.

use std::time::Duration;

/// Local persistence failure (quota, I/O, corrupt encoding).
///
/// Never swallowed: a `put` that fails must propagate synchronously, since
/// there is no later opportunity to recover unsaved user input.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Local store unavailable: {0}")]
    Database(#[from] sled::Error),

    #[error("Failed to encode pending submission: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Remote submission failure. Recoverable: the submission stays in the
/// local store and is retried on a later drain pass.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend rejected submission: {0}")]
    Rejected(String),
}

/// Failure while capturing a meeting report into the outbox.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The draft failed validation; nothing was written to the store.
    #[error("Invalid meeting report: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    /// The durable store could not persist the submission.
    #[error(transparent)]
    Store(#[from] StoreError),
}
