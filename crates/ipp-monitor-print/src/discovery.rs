// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS queue discovery.
//
// Asks a CUPS server for its print queues (CUPS-Get-Printers at the server
// root) so a queue can be picked and turned into a configured entry.

use tracing::{info, instrument, warn};

use ipp_monitor_core::config::PrinterEntryConfig;
use ipp_monitor_core::error::{MonitorError, Result};
use ipp_monitor_core::types::{ConnectionConfig, DiscoveredQueue, EntryId};

use crate::client::PrinterClient;

/// List the queues on the server behind `connection`.
///
/// The connection's base path is ignored; the query always goes to the
/// server root.  An empty list is `NoPrintersFound`.
#[instrument(skip(client, connection), fields(host = %connection.host, port = connection.port))]
pub async fn discover_queues(
    client: &dyn PrinterClient,
    connection: &ConnectionConfig,
) -> Result<Vec<DiscoveredQueue>> {
    let queues = client.list_queues(&connection.server_root()).await?;
    if queues.is_empty() {
        warn!("server reported no print queues");
        return Err(MonitorError::NoPrintersFound);
    }
    info!(count = queues.len(), "discovered print queues");
    Ok(queues)
}

/// Entry config for `queue_name` on the server behind `connection`.
///
/// The title is the queue name and the base path `/printers/{queue_name}`.
pub fn entry_for_queue(connection: &ConnectionConfig, queue_name: &str) -> PrinterEntryConfig {
    PrinterEntryConfig {
        id: EntryId::new(),
        name: queue_name.to_string(),
        connection: connection.for_queue(queue_name),
        simulation_mode: false,
    }
}

/// Pick `wanted` from the discovered queues, or the first one when `None`.
pub fn select_queue<'a>(
    queues: &'a [DiscoveredQueue],
    wanted: Option<&str>,
) -> Result<&'a DiscoveredQueue> {
    match wanted {
        Some(name) => queues.iter().find(|q| q.name == name).ok_or_else(|| {
            MonitorError::InvalidRequest(format!("queue '{name}' is not on this server"))
        }),
        None => queues.first().ok_or(MonitorError::NoPrintersFound),
    }
}
