// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

//! Remote submission seam.
//!
//! The sync engine only knows the [`RemoteSubmit`] trait; the production
//! implementation posts to the hosted data service, and tests plug in
//! recording stubs. Whatever the implementation, it must be idempotent keyed
//! by the submission's `id`: the engine will happily resend a report whose
//! acknowledgment was lost, and the remote side has to treat the resend as
//! already applied.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SubmitError;
use crate::models::PendingSubmission;

/// Caller-supplied "submit meeting" operation against the backend.
///
/// Contract: idempotent by `submission.id`. A second call with the same id
/// must observe the same end state as the first, never a duplicate record.
#[async_trait]
pub trait RemoteSubmit: Send + Sync {
    async fn submit(&self, submission: &PendingSubmission) -> Result<(), SubmitError>;
}

/// Default submit timeout; a hung request becomes an ordinary per-item
/// failure instead of stalling the drain forever.
const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP implementation of [`RemoteSubmit`] against the hosted data service.
///
/// Submits each report as flat key/value fields plus a JSON-encoded
/// attendance array, with upsert-on-id semantics so retries deduplicate on
/// the server.
#[derive(Clone)]
pub struct HttpRemote {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    timeout: Duration,
}

impl HttpRemote {
    /// Create a client for the given backend base URL and bearer token.
    pub fn new(base_url: String, api_token: String) -> Self {
        Self::with_timeout(base_url, api_token, DEFAULT_SUBMIT_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    pub fn with_timeout(base_url: String, api_token: String, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            timeout,
        }
    }

    /// Build the wire payload: flat fields plus the attendance array encoded
    /// as a JSON string, which is how the backend's "submit meeting"
    /// operation expects it.
    fn payload(submission: &PendingSubmission) -> Result<serde_json::Value, SubmitError> {
        let attendance = serde_json::to_string(&submission.attendance)
            .map_err(|e| SubmitError::Rejected(format!("Unencodable attendance: {}", e)))?;

        Ok(serde_json::json!({
            "id": submission.id,
            "cellId": submission.cell_id,
            "meetingDate": submission.meeting_date,
            "presenceScore": submission.presence_score,
            "decisionsCount": submission.decisions_count,
            "offeringAmount": submission.offering_amount,
            "theme": submission.theme,
            "notes": submission.notes,
            "attendance": attendance,
            "submittedByPersonId": submission.submitted_by_person_id,
            "capturedAt": submission.captured_at,
        }))
    }
}

#[async_trait]
impl RemoteSubmit for HttpRemote {
    async fn submit(&self, submission: &PendingSubmission) -> Result<(), SubmitError> {
        let url = format!("{}/rest/v1/meeting_reports?on_conflict=id", self.base_url);
        let body = Self::payload(submission)?;

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            // Upsert-by-id: a resend of an already-applied report merges
            // into the existing row instead of creating a duplicate.
            .header("Prefer", "resolution=merge-duplicates")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubmitError::Timeout(self.timeout)
                } else {
                    SubmitError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::CONFLICT {
            // 409 means the report already landed on a previous attempt.
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(SubmitError::Rejected(format!("{}: {}", status, detail)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_payload_flattens_fields_and_encodes_attendance() {
        let submission = PendingSubmission {
            id: "m1".to_string(),
            cell_id: "cell-1".to_string(),
            meeting_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            presence_score: Some(5),
            decisions_count: 2,
            offering_amount: 40.0,
            theme: None,
            notes: Some("good meeting".to_string()),
            attendance: vec![crate::models::AttendanceEntry {
                person_id: "p1".to_string(),
                present: true,
                is_visitor: false,
                checkin_lat: None,
                checkin_lng: None,
                checkin_at: None,
            }],
            submitted_by_person_id: "leader-1".to_string(),
            captured_at: chrono::Utc::now(),
        };

        let payload = HttpRemote::payload(&submission).unwrap();
        assert_eq!(payload["id"], "m1");
        assert_eq!(payload["cellId"], "cell-1");
        assert_eq!(payload["decisionsCount"], 2);

        // Attendance travels as a JSON string, not a nested array.
        let attendance = payload["attendance"].as_str().expect("string-encoded");
        let decoded: Vec<crate::models::AttendanceEntry> =
            serde_json::from_str(attendance).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].person_id, "p1");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let remote = HttpRemote::new("https://api.example.test/".to_string(), "t".to_string());
        assert_eq!(remote.base_url, "https://api.example.test");
    }
}
