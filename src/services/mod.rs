// SPDX-License-Identifier: MIT
// Copyright 2026 Celula Team <dev@celula.app>

//! Services module - sync engine, connectivity, remote submission.

pub mod connectivity;
pub mod remote;
pub mod sync;

pub use connectivity::ConnectivityGate;
pub use remote::{HttpRemote, RemoteSubmit};
pub use sync::{DrainOutcome, DrainReport, ItemOutcome, RetryPolicy, SyncEngine};
