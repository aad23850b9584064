// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The seam between the coordinator and the network.
//
// Coordinators and the job submitter only ever talk to a printer through this
// trait, so tests can swap in a scripted client and the real IPP client stays a
// thin adapter.

use async_trait::async_trait;

use ipp_monitor_core::error::Result;
use ipp_monitor_core::types::{ConnectionConfig, DiscoveredQueue, JobMetadata, PrinterStatus};

/// Operations the service needs from a printer.
///
/// Implementations must be safe to call concurrently; the poller and any
/// number of submissions may use the same client at once.  Failures are
/// reported as `MonitorError::Connection` (transport) or
/// `MonitorError::Protocol` (the printer answered but rejected or garbled the
/// exchange).
#[async_trait]
pub trait PrinterClient: Send + Sync {
    /// Fetch the current printer state (Get-Printer-Attributes).
    async fn fetch_status(&self, connection: &ConnectionConfig) -> Result<PrinterStatus>;

    /// Submit a document (Print-Job).
    async fn submit_job(
        &self,
        connection: &ConnectionConfig,
        document: Vec<u8>,
        metadata: &JobMetadata,
    ) -> Result<()>;

    /// List the queues served at the connection's server root
    /// (CUPS-Get-Printers).
    async fn list_queues(&self, connection: &ConnectionConfig) -> Result<Vec<DiscoveredQueue>>;
}
