// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Poll health for one coordinator.
//
// Tracks whether the most recent refresh succeeded, how many refreshes in a
// row have failed, and the last error.  It never changes the poll interval:
// a failing printer is retried on the next regular tick.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Health of the status refresh loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollHealth {
    /// Whether the latest refresh succeeded.  `true` before the first poll.
    pub last_update_success: bool,
    /// Number of consecutive failed refreshes.
    pub consecutive_failures: u32,
    /// Message of the latest failure, cleared on success.
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl Default for PollHealth {
    fn default() -> Self {
        Self {
            last_update_success: true,
            consecutive_failures: 0,
            last_error: None,
            last_success_at: None,
            last_failure_at: None,
        }
    }
}

impl PollHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful refresh.
    pub fn record_success(&mut self, printer_uri: &str) {
        if !self.last_update_success {
            info!(
                uri = printer_uri,
                failures = self.consecutive_failures,
                "printer reachable again"
            );
        }
        self.last_update_success = true;
        self.consecutive_failures = 0;
        self.last_error = None;
        self.last_success_at = Some(Utc::now());
    }

    /// Record a failed refresh.
    ///
    /// Returns `true` when this failure flips the health from good to bad,
    /// i.e. the first failure after a success.
    pub fn record_failure(&mut self, printer_uri: &str, error: &str) -> bool {
        let newly_failed = self.last_update_success;
        self.last_update_success = false;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error.to_string());
        self.last_failure_at = Some(Utc::now());

        if newly_failed {
            warn!(uri = printer_uri, error, "status refresh failed");
        } else {
            warn!(
                uri = printer_uri,
                failures = self.consecutive_failures,
                error,
                "status refresh still failing"
            );
        }
        newly_failed
    }

    /// Human-readable message, `None` while healthy.
    pub fn status_message(&self) -> Option<String> {
        if self.last_update_success {
            return None;
        }
        let detail = self.last_error.as_deref().unwrap_or("unknown error");
        Some(if self.consecutive_failures == 1 {
            format!("The last status update failed ({detail}). Showing the previous status.")
        } else {
            format!(
                "The last {} status updates failed ({detail}). Showing the previous status.",
                self.consecutive_failures
            )
        })
    }
}
