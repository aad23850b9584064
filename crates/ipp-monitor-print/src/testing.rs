// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted `PrinterClient` for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use ipp_monitor_core::error::{MonitorError, Result};
use ipp_monitor_core::types::{ConnectionConfig, DiscoveredQueue, JobMetadata, PrinterStatus};

use crate::client::PrinterClient;

/// Replays queued results and counts calls.
///
/// An empty status script answers with a connection error; an empty submit
/// script answers with success.
#[derive(Default)]
pub struct ScriptedClient {
    statuses: Mutex<VecDeque<Result<PrinterStatus>>>,
    submits: Mutex<VecDeque<Result<()>>>,
    queues: Mutex<Option<Vec<DiscoveredQueue>>>,
    fetch_calls: Mutex<usize>,
    submitted: Mutex<Vec<(String, usize)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, result: Result<PrinterStatus>) {
        self.statuses.lock().unwrap().push_back(result);
    }

    pub fn push_submit(&self, result: Result<()>) {
        self.submits.lock().unwrap().push_back(result);
    }

    pub fn set_queues(&self, queues: Vec<DiscoveredQueue>) {
        *self.queues.lock().unwrap() = Some(queues);
    }

    pub fn fetch_calls(&self) -> usize {
        *self.fetch_calls.lock().unwrap()
    }

    pub fn submit_calls(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    /// `(printer URI, document length)` for each submission.
    pub fn submitted(&self) -> Vec<(String, usize)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PrinterClient for ScriptedClient {
    async fn fetch_status(&self, _connection: &ConnectionConfig) -> Result<PrinterStatus> {
        *self.fetch_calls.lock().unwrap() += 1;
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MonitorError::Connection("script exhausted".into())))
    }

    async fn submit_job(
        &self,
        connection: &ConnectionConfig,
        document: Vec<u8>,
        _metadata: &JobMetadata,
    ) -> Result<()> {
        self.submitted
            .lock()
            .unwrap()
            .push((connection.printer_uri(), document.len()));
        self.submits.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn list_queues(&self, _connection: &ConnectionConfig) -> Result<Vec<DiscoveredQueue>> {
        self.queues
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| MonitorError::Connection("connection refused".into()))
    }
}
