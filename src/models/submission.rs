// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

//! Meeting-report models for the offline outbox.
//!
//! A report enters the system as a loosely-shaped [`SubmissionDraft`] coming
//! from the capture form. The draft is validated at the capture boundary and
//! sealed into an immutable [`PendingSubmission`], so malformed data never
//! reaches the durable store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// One attendance row in a meeting report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    /// Person ID (member or registered visitor), unique within the report
    pub person_id: String,
    /// Whether the person attended the meeting
    pub present: bool,
    /// Whether the person attended as a visitor
    pub is_visitor: bool,
    /// Check-in latitude, if the device captured a position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin_lat: Option<f64>,
    /// Check-in longitude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin_lng: Option<f64>,
    /// Check-in time on the device clock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin_at: Option<DateTime<Utc>>,
}

/// A buffered cell-meeting report awaiting delivery to the backend.
///
/// Immutable once created: corrections are expressed as brand-new
/// submissions with their own ids, never as edits. The `id` doubles as the
/// local store key and the remote idempotency handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSubmission {
    /// Client-generated UUID, assigned once at capture and never regenerated
    pub id: String,
    /// Owning cell ("célula") ID
    pub cell_id: String,
    /// Calendar day of the meeting (no time component)
    pub meeting_date: NaiveDate,
    /// 1-5 "spiritual temperature" indicator
    pub presence_score: Option<u8>,
    /// Number of decisions made during the meeting
    pub decisions_count: u32,
    /// Offering collected, non-negative
    pub offering_amount: f64,
    /// Meeting theme
    pub theme: Option<String>,
    /// Leader notes
    pub notes: Option<String>,
    /// Per-person attendance, in form order
    pub attendance: Vec<AttendanceEntry>,
    /// Person ID of the leader who filed the report
    pub submitted_by_person_id: String,
    /// Client clock at the moment of original capture.
    /// Used only for ordering and display, never for idempotency.
    pub captured_at: DateTime<Utc>,
}

impl PendingSubmission {
    /// Validate a draft and seal it into an immutable pending submission.
    ///
    /// Assigns the client-generated id and the capture timestamp. Called at
    /// the capture boundary, whether or not the device is online.
    pub fn from_draft(draft: SubmissionDraft) -> Result<Self, ValidationErrors> {
        draft.validate()?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            cell_id: draft.cell_id,
            meeting_date: draft.meeting_date,
            presence_score: draft.presence_score,
            decisions_count: draft.decisions_count,
            offering_amount: draft.offering_amount,
            theme: draft.theme,
            notes: draft.notes,
            attendance: draft.attendance,
            submitted_by_person_id: draft.submitted_by_person_id,
            captured_at: Utc::now(),
        })
    }
}

/// Capture-form input for one meeting report, validated before it is allowed
/// into the durable store.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDraft {
    #[validate(length(min = 1, message = "cell id is required"))]
    pub cell_id: String,
    pub meeting_date: NaiveDate,
    #[validate(range(min = 1, max = 5, message = "presence score must be 1-5"))]
    pub presence_score: Option<u8>,
    #[serde(default)]
    pub decisions_count: u32,
    #[serde(default)]
    #[validate(custom(function = validate_offering))]
    pub offering_amount: f64,
    pub theme: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_attendance))]
    pub attendance: Vec<AttendanceEntry>,
    #[validate(length(min = 1, message = "submitter person id is required"))]
    pub submitted_by_person_id: String,
}

/// Offerings must be a non-negative, finite amount.
fn validate_offering(amount: f64) -> Result<(), ValidationError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(validation_error(
            "offering_amount",
            "offering amount must be a non-negative number",
        ));
    }
    Ok(())
}

/// Person ids must be present and unique within the attendance list.
fn validate_attendance(attendance: &[AttendanceEntry]) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    for entry in attendance {
        if entry.person_id.is_empty() {
            return Err(validation_error(
                "attendance",
                "attendance entry is missing a person id",
            ));
        }
        if !seen.insert(entry.person_id.as_str()) {
            return Err(validation_error(
                "attendance",
                "duplicate person id in attendance list",
            ));
        }
    }
    Ok(())
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}
