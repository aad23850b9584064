// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Latest-value cache of one printer's `CoordinatorState`.
//
// Backed by a `tokio::sync::watch` channel: commits replace one half of the
// state under the channel's write lock, readers clone the committed value, and
// subscribers are woken without the writer ever waiting on them.  A slow
// subscriber simply sees the newest value when it next looks.

use tokio::sync::watch;
use tracing::trace;

use ipp_monitor_core::types::{CoordinatorState, JobRecord, PrinterStatus};

/// Serialized store for the status half and the job half of a printer's
/// state.
#[derive(Debug)]
pub struct StatusCache {
    tx: watch::Sender<CoordinatorState>,
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCache {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CoordinatorState::default());
        Self { tx }
    }

    /// Snapshot of the latest committed state.
    pub fn read(&self) -> CoordinatorState {
        self.tx.borrow().clone()
    }

    /// Replace the printer status; the job record is left as is.
    pub fn commit_status(&self, status: PrinterStatus) {
        trace!(state = %status.state, "committing printer status");
        self.tx.send_modify(|state| state.status = Some(status));
    }

    /// Replace the job record; the printer status is left as is.
    pub fn commit_job(&self, job: JobRecord) {
        trace!(status = job.status.as_str(), "committing job record");
        self.tx.send_modify(|state| state.last_job = Some(job));
    }

    /// Receiver that is marked changed after every commit.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
