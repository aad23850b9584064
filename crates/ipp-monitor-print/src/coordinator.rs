// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-printer status coordinator.
//
// Owns the printer's `StatusCache` and `PollHealth`, performs status
// refreshes through the `PrinterClient`, and accepts job records from the
// submitter.  Listeners get two feeds: the cache's latest-value receiver and a
// broadcast of discrete events, including refresh failures.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, watch};
use tracing::{debug, instrument};

use ipp_monitor_core::types::{
    ConnectionConfig, CoordinatorState, EntryId, JobOutcome, JobRecord,
};

use crate::cache::StatusCache;
use crate::client::PrinterClient;
use crate::health::PollHealth;

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 64;

/// Something changed about a printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    /// A poll committed a new `PrinterStatus`.
    StatusUpdated,
    /// A submission committed a new `JobRecord`.
    JobRecorded(JobOutcome),
    /// A poll failed; the previous status is kept.
    RefreshFailed { error: String },
}

/// Coordinates polling and job records for one configured printer.
pub struct Coordinator {
    entry_id: EntryId,
    connection: Arc<ConnectionConfig>,
    client: Arc<dyn PrinterClient>,
    cache: StatusCache,
    health: Mutex<PollHealth>,
    events: broadcast::Sender<CoordinatorEvent>,
    /// Held for the duration of a fetch so refreshes never overlap.
    refreshing: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("entry_id", &self.entry_id)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    pub fn new(
        entry_id: EntryId,
        connection: Arc<ConnectionConfig>,
        client: Arc<dyn PrinterClient>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entry_id,
            connection,
            client,
            cache: StatusCache::new(),
            health: Mutex::new(PollHealth::new()),
            events,
            refreshing: tokio::sync::Mutex::new(()),
        }
    }

    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }

    /// The immutable connection snapshot this coordinator polls.
    pub fn connection(&self) -> Arc<ConnectionConfig> {
        Arc::clone(&self.connection)
    }

    /// Latest committed state.
    pub fn read(&self) -> CoordinatorState {
        self.cache.read()
    }

    /// Latest-value feed of the state.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.cache.subscribe()
    }

    /// Discrete change and failure events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    /// Copy of the current poll health.
    pub fn health(&self) -> PollHealth {
        self.health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// State and health from the same refresh.
    ///
    /// Refreshes commit the status while holding the health lock, so the pair
    /// never mixes two polls.
    pub fn view(&self) -> (CoordinatorState, PollHealth) {
        let health = self.lock_health();
        (self.cache.read(), health.clone())
    }

    /// Fetch the printer status once and commit the result.
    ///
    /// Failures are absorbed: the cached status is left untouched, the health
    /// is marked failed and a `RefreshFailed` event is sent.  Returns whether
    /// the fetch succeeded.
    #[instrument(skip(self), fields(entry_id = %self.entry_id))]
    pub async fn refresh(&self) -> bool {
        let _guard = self.refreshing.lock().await;
        let uri = self.connection.printer_uri();

        debug!("refreshing printer status");
        match self.client.fetch_status(&self.connection).await {
            Ok(status) => {
                let mut health = self.lock_health();
                self.cache.commit_status(status);
                health.record_success(&uri);
                drop(health);
                // No subscribers is fine.
                let _ = self.events.send(CoordinatorEvent::StatusUpdated);
                true
            }
            Err(e) => {
                let error = e.to_string();
                self.lock_health().record_failure(&uri, &error);
                let _ = self.events.send(CoordinatorEvent::RefreshFailed { error });
                false
            }
        }
    }

    /// Commit the outcome of a submission.  The printer status is not touched.
    pub fn record_job(&self, job: JobRecord) {
        let outcome = job.status;
        self.cache.commit_job(job);
        let _ = self.events.send(CoordinatorEvent::JobRecorded(outcome));
    }

    fn lock_health(&self) -> std::sync::MutexGuard<'_, PollHealth> {
        self.health.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
