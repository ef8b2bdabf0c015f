// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

//! Durable local store for pending submissions, backed by sled.
//!
//! One tree, one key namespace: submissions are keyed by their
//! client-generated id and stored as JSON values. The whole point of this
//! store, as opposed to an in-memory queue, is that a record which was `put`
//! successfully is recoverable after an abrupt process kill and restart.

use std::path::Path;

use crate::db::trees;
use crate::error::StoreError;
use crate::models::PendingSubmission;

/// Keyed, restart-surviving container for not-yet-acknowledged meeting
/// reports.
///
/// Explicitly constructed and passed into the sync engine, so tests and
/// multi-tenant hosts can run several independent stores in one process.
#[derive(Clone)]
pub struct OutboxStore {
    tree: sled::Tree,
}

impl OutboxStore {
    /// Open (or create) the outbox store at the given directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::Config::new().path(path.as_ref()).open()?;
        let tree = db.open_tree(trees::PENDING_SUBMISSIONS)?;

        tracing::debug!(
            path = %path.as_ref().display(),
            pending = tree.len(),
            "Outbox store opened"
        );

        Ok(Self { tree })
    }

    /// Insert or overwrite the record at `submission.id`.
    ///
    /// Flushes before returning: once this call succeeds the record survives
    /// an abrupt process termination. Storage failures propagate to the
    /// caller; they must never be swallowed, because the user's input has no
    /// other copy.
    pub fn put(&self, submission: &PendingSubmission) -> Result<(), StoreError> {
        let value = serde_json::to_vec(submission)?;
        self.tree.insert(submission.id.as_bytes(), value)?;
        self.tree.flush()?;
        Ok(())
    }

    /// Return all pending submissions, oldest capture first.
    ///
    /// Side-effect-free. Ties on `captured_at` are broken by id so the drain
    /// order is deterministic. A value that no longer decodes is logged and
    /// skipped, but left on disk for inspection rather than deleted.
    pub fn get_all(&self) -> Result<Vec<PendingSubmission>, StoreError> {
        let mut pending = Vec::with_capacity(self.tree.len());

        for item in self.tree.iter() {
            let (key, value) = item?;
            match serde_json::from_slice::<PendingSubmission>(&value) {
                Ok(submission) => pending.push(submission),
                Err(err) => {
                    tracing::warn!(
                        key = %String::from_utf8_lossy(&key),
                        error = %err,
                        "Skipping pending submission that failed to decode"
                    );
                }
            }
        }

        pending.sort_by(|a, b| {
            a.captured_at
                .cmp(&b.captured_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(pending)
    }

    /// Delete the record with the given id.
    ///
    /// Removing a missing key is a no-op, not an error, so acknowledgment
    /// cleanup is safely re-entrant.
    pub fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.tree.remove(id.as_bytes())?;
        self.tree.flush()?;
        Ok(())
    }

    /// Number of submissions still awaiting delivery.
    ///
    /// Backs the "N reports waiting to sync" affordance in the capture UI.
    /// Counts only records that decode, so it always agrees with what
    /// `get_all` will hand to a drain; bytes that fail to decode are
    /// retained on disk but not counted.
    pub fn pending_count(&self) -> usize {
        self.tree
            .iter()
            .values()
            .filter_map(|value| value.ok())
            .filter(|value| serde_json::from_slice::<PendingSubmission>(value).is_ok())
            .count()
    }
}
