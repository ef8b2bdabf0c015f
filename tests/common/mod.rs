// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use celula_sync::db::OutboxStore;
use celula_sync::error::SubmitError;
use celula_sync::models::{AttendanceEntry, PendingSubmission, SubmissionDraft};
use celula_sync::services::RemoteSubmit;
use chrono::{NaiveDate, TimeZone, Utc};

/// Open a store in a fresh temp directory. Keep the TempDir alive for the
/// duration of the test.
#[allow(dead_code)]
pub fn temp_store() -> (OutboxStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = OutboxStore::open(dir.path()).expect("open store");
    (store, dir)
}

/// Build a pending submission with a fixed id and capture time, bypassing
/// the capture boundary so tests control ordering exactly.
#[allow(dead_code)]
pub fn submission(id: &str, cell_id: &str, captured_at_secs: i64) -> PendingSubmission {
    PendingSubmission {
        id: id.to_string(),
        cell_id: cell_id.to_string(),
        meeting_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
        presence_score: Some(3),
        decisions_count: 0,
        offering_amount: 25.0,
        theme: Some("Encounter".to_string()),
        notes: None,
        attendance: vec![AttendanceEntry {
            person_id: "p1".to_string(),
            present: true,
            is_visitor: false,
            checkin_lat: None,
            checkin_lng: None,
            checkin_at: None,
        }],
        submitted_by_person_id: "leader-1".to_string(),
        captured_at: Utc.timestamp_opt(captured_at_secs, 0).unwrap(),
    }
}

/// A valid capture-form draft.
#[allow(dead_code)]
pub fn draft(cell_id: &str) -> SubmissionDraft {
    SubmissionDraft {
        cell_id: cell_id.to_string(),
        meeting_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
        presence_score: Some(4),
        decisions_count: 1,
        offering_amount: 50.0,
        theme: None,
        notes: Some("captured in test".to_string()),
        attendance: vec![],
        submitted_by_person_id: "leader-1".to_string(),
    }
}

/// Recording stand-in for the backend's "submit meeting" operation.
///
/// Models the remote side as an upsert-by-id table, so a resend of the same
/// id overwrites instead of duplicating, exactly like the real backend.
/// Failures are injected per id, either forever or for the first N calls.
#[allow(dead_code)]
pub struct StubRemote {
    calls: Mutex<Vec<String>>,
    table: Mutex<HashMap<String, PendingSubmission>>,
    fail_remaining: Mutex<HashMap<String, u32>>,
    fail_all: Mutex<bool>,
    delay: Option<std::time::Duration>,
}

#[allow(dead_code)]
impl StubRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            table: Mutex::new(HashMap::new()),
            fail_remaining: Mutex::new(HashMap::new()),
            fail_all: Mutex::new(false),
            delay: None,
        })
    }

    /// A stub that sleeps on every call, to widen race windows.
    pub fn slow(delay: std::time::Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            table: Mutex::new(HashMap::new()),
            fail_remaining: Mutex::new(HashMap::new()),
            fail_all: Mutex::new(false),
            delay: Some(delay),
        })
    }

    /// Make every submit of every id fail.
    pub fn fail_everything(&self) {
        *self.fail_all.lock().unwrap() = true;
    }

    /// Make every submit of `id` fail.
    pub fn fail_always(&self, id: &str) {
        self.fail_remaining
            .lock()
            .unwrap()
            .insert(id.to_string(), u32::MAX);
    }

    /// Make the first `n` submits of `id` fail, then succeed.
    pub fn fail_times(&self, id: &str, n: u32) {
        self.fail_remaining.lock().unwrap().insert(id.to_string(), n);
    }

    /// Ids in the order they were submitted (including failed attempts).
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of records that exist remotely.
    pub fn remote_count(&self) -> usize {
        self.table.lock().unwrap().len()
    }

    /// The remote record for `id`, if any.
    pub fn remote_record(&self, id: &str) -> Option<PendingSubmission> {
        self.table.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl RemoteSubmit for StubRemote {
    async fn submit(&self, submission: &PendingSubmission) -> Result<(), SubmitError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.calls.lock().unwrap().push(submission.id.clone());

        if *self.fail_all.lock().unwrap() {
            return Err(SubmitError::Network("injected failure".to_string()));
        }

        {
            let mut failures = self.fail_remaining.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&submission.id) {
                if *remaining > 0 {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    return Err(SubmitError::Network("injected failure".to_string()));
                }
            }
        }

        // Upsert by id: the idempotency contract the engine relies on.
        self.table
            .lock()
            .unwrap()
            .insert(submission.id.clone(), submission.clone());
        Ok(())
    }
}
