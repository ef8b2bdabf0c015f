// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

//! Data models for the outbox.

pub mod submission;

pub use submission::{AttendanceEntry, PendingSubmission, SubmissionDraft};
