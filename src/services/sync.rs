// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

//! Sync engine: reconciles the local outbox with the backend.
//!
//! Delivery model is at-least-once with idempotent acknowledgment. A
//! submission leaves the store only after the remote operation for its id
//! reports success; the crash window between "remote accepted" and "local
//! removed" is closed by the remote side deduplicating on id.
//!
//! Drain passes are strictly sequential per engine: a drain requested while
//! another is in flight queues behind it on the drain mutex, so two passes
//! can never race to remove the same record. Captures may land new ids while
//! a drain is running; the store tolerates that.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::db::OutboxStore;
use crate::error::{CaptureError, StoreError, SubmitError};
use crate::models::{PendingSubmission, SubmissionDraft};
use crate::services::{ConnectivityGate, RemoteSubmit};

/// Retry policy for submissions that keep failing.
///
/// Backoff state lives in memory only: a process restart retries everything
/// immediately on the next reconnect, which preserves the historical
/// retry-on-every-reconnect behavior as the baseline.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the second attempt; doubles per failure after that.
    pub base: Duration,
    /// Upper bound on the per-item delay.
    pub cap: Duration,
    /// When set, items that have failed this many times are reported as
    /// dead-lettered and skipped. They stay in the store; deleting a report
    /// the backend never accepted would be data loss.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(2),
            cap: Duration::from_secs(300),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Retry immediately on every drain, forever. The original behavior.
    pub fn immediate() -> Self {
        Self {
            base: Duration::ZERO,
            cap: Duration::ZERO,
            max_attempts: None,
        }
    }

    /// Delay before the next attempt, given how many attempts have failed.
    fn delay_after(&self, failed_attempts: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed_attempts.saturating_sub(1));
        self.base.saturating_mul(factor).min(self.cap)
    }
}

/// In-memory retry bookkeeping for one submission id.
#[derive(Debug, Clone, Copy)]
struct AttemptState {
    failed_attempts: u32,
    next_attempt_at: Instant,
}

/// Outcome of one submission within a drain pass.
#[derive(Debug)]
pub enum DrainOutcome {
    /// Remote accepted; the record was removed from the store.
    Delivered,
    /// Remote submission failed; the record stays pending.
    Failed(SubmitError),
    /// Skipped this pass because its backoff window has not elapsed.
    Deferred,
    /// Skipped because it reached the configured attempt limit.
    DeadLettered,
}

/// One submission's id and what happened to it during a drain.
#[derive(Debug)]
pub struct ItemOutcome {
    pub id: String,
    pub outcome: DrainOutcome,
}

/// Aggregated result of one drain pass.
///
/// Per-item failures are data here, not errors: total failure of a batch is
/// expected transient behavior under flaky connectivity, so `drain` never
/// raises for it.
#[derive(Debug, Default)]
pub struct DrainReport {
    pub items: Vec<ItemOutcome>,
}

impl DrainReport {
    pub fn delivered(&self) -> usize {
        self.count(|o| matches!(o, DrainOutcome::Delivered))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DrainOutcome::Failed(_)))
    }

    pub fn deferred(&self) -> usize {
        self.count(|o| matches!(o, DrainOutcome::Deferred))
    }

    pub fn dead_lettered(&self) -> usize {
        self.count(|o| matches!(o, DrainOutcome::DeadLettered))
    }

    fn count(&self, pred: impl Fn(&DrainOutcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }
}

/// Drains the outbox against the backend, removing entries only on
/// confirmed success.
///
/// Cheap to clone; clones share the store handle, the drain mutex, and the
/// retry bookkeeping, so a clone handed to a background task still
/// serializes against every other drain.
#[derive(Clone)]
pub struct SyncEngine {
    store: OutboxStore,
    remote: Arc<dyn RemoteSubmit>,
    gate: Arc<ConnectivityGate>,
    retry: RetryPolicy,
    /// Serializes drain passes; a new request queues behind the in-flight one.
    drain_lock: Arc<Mutex<()>>,
    /// Per-id retry bookkeeping, keyed by submission id.
    attempts: Arc<DashMap<String, AttemptState>>,
}

impl SyncEngine {
    pub fn new(
        store: OutboxStore,
        remote: Arc<dyn RemoteSubmit>,
        gate: Arc<ConnectivityGate>,
    ) -> Self {
        Self::with_retry_policy(store, remote, gate, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        store: OutboxStore,
        remote: Arc<dyn RemoteSubmit>,
        gate: Arc<ConnectivityGate>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            remote,
            gate,
            retry,
            drain_lock: Arc::new(Mutex::new(())),
            attempts: Arc::new(DashMap::new()),
        }
    }

    /// The underlying store, for pending-count affordances.
    pub fn store(&self) -> &OutboxStore {
        &self.store
    }

    /// Capture a meeting report: validate the draft, persist it durably,
    /// and kick off a background drain if the device looks online.
    ///
    /// Persistence happens before any network is touched, so capture works
    /// identically offline and returns as soon as the report is durable; it
    /// never waits on the backlog crossing the network. Storage failures
    /// from the `put` propagate to the caller synchronously; there is no
    /// later chance to recover the user's input. Drain failures do not: the
    /// report is already safe locally.
    pub async fn capture(&self, draft: SubmissionDraft) -> Result<PendingSubmission, CaptureError> {
        let submission = PendingSubmission::from_draft(draft)?;
        self.store.put(&submission)?;

        tracing::info!(
            id = %submission.id,
            cell_id = %submission.cell_id,
            pending = self.store.pending_count(),
            "Meeting report buffered"
        );

        if self.gate.is_online() {
            let engine = self.clone();
            tokio::spawn(async move {
                if let Err(err) = engine.drain().await {
                    tracing::error!(error = %err, "Drain after capture failed");
                }
            });
        }

        Ok(submission)
    }

    /// Attempt to deliver every pending submission, oldest capture first.
    ///
    /// Skips entirely while the gate reports offline (zero remote calls,
    /// store untouched). Items are submitted sequentially, never
    /// concurrently, to bound backend load and keep per-cell ordering; one
    /// item's failure never blocks its siblings. Only a store failure
    /// raises; remote failures are reported per item.
    pub async fn drain(&self) -> Result<DrainReport, StoreError> {
        let _guard = self.drain_lock.lock().await;

        if !self.gate.is_online() {
            tracing::debug!("Drain skipped: offline");
            return Ok(DrainReport::default());
        }

        let pending = self.store.get_all()?;
        if pending.is_empty() {
            return Ok(DrainReport::default());
        }

        tracing::info!(pending = pending.len(), "Draining outbox");
        let mut report = DrainReport::default();

        for submission in pending {
            let outcome = self.attempt(&submission).await?;
            report.items.push(ItemOutcome {
                id: submission.id,
                outcome,
            });
        }

        tracing::info!(
            delivered = report.delivered(),
            failed = report.failed(),
            deferred = report.deferred(),
            dead_lettered = report.dead_lettered(),
            "Drain pass complete"
        );

        Ok(report)
    }

    /// Run forever, draining on every offline-to-online transition.
    ///
    /// Spawn this on the runtime next to the platform task that feeds
    /// [`ConnectivityGate::set_online`].
    pub async fn run(&self) {
        let mut transitions = self.gate.subscribe();

        loop {
            if transitions.changed().await.is_err() {
                break;
            }
            // The gate only notifies on actual transitions, so seeing `true`
            // here means connectivity was just regained.
            if *transitions.borrow_and_update() {
                if let Err(err) = self.drain().await {
                    tracing::error!(error = %err, "Drain after reconnect failed");
                }
            }
        }
    }

    /// Try one submission, honoring its backoff window and attempt limit.
    async fn attempt(&self, submission: &PendingSubmission) -> Result<DrainOutcome, StoreError> {
        if let Some(state) = self.attempts.get(&submission.id).map(|s| *s) {
            if let Some(max) = self.retry.max_attempts {
                if state.failed_attempts >= max {
                    tracing::warn!(
                        id = %submission.id,
                        attempts = state.failed_attempts,
                        "Submission reached attempt limit; leaving in store"
                    );
                    return Ok(DrainOutcome::DeadLettered);
                }
            }
            if state.next_attempt_at > Instant::now() {
                tracing::debug!(id = %submission.id, "Submission deferred by backoff");
                return Ok(DrainOutcome::Deferred);
            }
        }

        match self.remote.submit(submission).await {
            Ok(()) => {
                // Remote accepted. If we die before the remove lands, the
                // resend on the next drain deduplicates on id remotely.
                self.store.remove(&submission.id)?;
                self.attempts.remove(&submission.id);
                tracing::debug!(id = %submission.id, "Submission delivered");
                Ok(DrainOutcome::Delivered)
            }
            Err(err) => {
                let failed_attempts = self.note_failure(&submission.id);
                tracing::warn!(
                    id = %submission.id,
                    attempts = failed_attempts,
                    error = %err,
                    "Submission failed; will retry"
                );
                Ok(DrainOutcome::Failed(err))
            }
        }
    }

    /// Record a failed attempt and schedule the next one. Returns the new
    /// failure count.
    fn note_failure(&self, id: &str) -> u32 {
        let mut entry = self.attempts.entry(id.to_string()).or_insert(AttemptState {
            failed_attempts: 0,
            next_attempt_at: Instant::now(),
        });
        entry.failed_attempts += 1;
        entry.next_attempt_at = Instant::now() + self.retry.delay_after(entry.failed_attempts);
        entry.failed_attempts
    }
}
