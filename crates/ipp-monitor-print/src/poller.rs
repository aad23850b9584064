// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixed-interval status poller.
//
// `Poller::start` runs the first refresh to completion before returning, so a
// started poller always has a first result (success or recorded failure).
// Later refreshes run on a background task every `interval`.  Failures do not
// change the interval.
//
// Shutdown mirrors the IPP server lifecycle: a `Notify` signal plus a join on
// the task handle.  A fetch in flight at shutdown is dropped before it
// commits; commits are single atomic writes, so nothing is left half-written.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use ipp_monitor_core::error::{MonitorError, Result};

use crate::coordinator::Coordinator;

/// Default time between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Background refresh loop for one coordinator.
pub struct Poller {
    interval: Duration,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl Poller {
    /// Run the first refresh, then keep refreshing every `interval`.
    pub async fn start(coordinator: Arc<Coordinator>, interval: Duration) -> Self {
        let ok = coordinator.refresh().await;
        info!(
            entry_id = %coordinator.entry_id(),
            first_refresh_ok = ok,
            interval_secs = interval.as_secs(),
            "status poller ready"
        );

        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(Self::run(coordinator, interval, Arc::clone(&shutdown)));

        Self {
            interval,
            shutdown,
            task: Some(task),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the loop and wait for the task to exit.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        self.shutdown.notify_one();
        task.await
            .map_err(|e| MonitorError::Server(format!("poller task join: {e}")))?;
        debug!("status poller stopped");
        Ok(())
    }

    async fn run(coordinator: Arc<Coordinator>, interval: Duration, shutdown: Arc<Notify>) {
        // The first tick is one interval out; `start` already refreshed.
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.notified() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                biased;
                _ = shutdown.notified() => break,
                _ = coordinator.refresh() => {}
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
