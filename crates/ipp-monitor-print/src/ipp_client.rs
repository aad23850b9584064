// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async IPP client for communicating with network printers.
//
// Uses the `ipp` crate's async API to send the three operations the service
// needs:
//   - Get-Printer-Attributes  (RFC 8011 §4.2.5)
//   - Print-Job               (RFC 8011 §4.2.1)
//   - CUPS-Get-Printers       (CUPS IPP extension)
//
// The client is stateless: a fresh `AsyncIppClient` is built from the
// immutable `ConnectionConfig` for every operation, so concurrent use is safe
// and a config change only needs a new entry.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use ipp::prelude::*;
use tracing::{debug, error, info, instrument};

use ipp_monitor_core::error::{MonitorError, Result};
use ipp_monitor_core::types::{
    ConnectionConfig, DiscoveredQueue, JobMetadata, PrinterState, PrinterStatus,
};

use crate::client::PrinterClient;

/// Upper bound on a single IPP exchange.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Attributes requested on every status poll.
const STATUS_ATTRIBUTES: &[&str] = &[
    "printer-state",
    "printer-state-message",
    "printer-state-reasons",
];

/// [`PrinterClient`] backed by the `ipp` crate.
#[derive(Debug, Clone, Default)]
pub struct IppClient {
    timeout: Option<Duration>,
}

impl IppClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-request timeout (default 30 s).
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    fn build(&self, connection: &ConnectionConfig, uri: Uri) -> AsyncIppClient {
        let mut builder = AsyncIppClient::builder(uri)
            .ignore_tls_errors(!connection.verify_tls)
            .request_timeout(self.timeout.unwrap_or(REQUEST_TIMEOUT));
        if let Some((username, password)) = connection.credentials() {
            builder = builder.basic_auth(username, password);
        }
        builder.build()
    }
}

/// Parse the connection's printer URI.
pub fn parse_uri(connection: &ConnectionConfig) -> Result<Uri> {
    let uri = connection.printer_uri();
    uri.parse()
        .map_err(|e| MonitorError::Config(format!("invalid printer URI '{uri}': {e}")))
}

#[async_trait]
impl PrinterClient for IppClient {
    /// Query the printer for its current state.
    #[instrument(skip(self, connection), fields(uri = %connection.printer_uri()))]
    async fn fetch_status(&self, connection: &ConnectionConfig) -> Result<PrinterStatus> {
        let uri = parse_uri(connection)?;
        let operation = IppOperationBuilder::get_printer_attributes(uri.clone())
            .attributes(STATUS_ATTRIBUTES)
            .build();
        let client = self.build(connection, uri);

        debug!("sending Get-Printer-Attributes");
        let response = client
            .send(operation)
            .await
            .map_err(|e| MonitorError::Connection(format!("Get-Printer-Attributes: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "Get-Printer-Attributes failed");
            return Err(MonitorError::Protocol(format!(
                "Get-Printer-Attributes returned status {code:?}"
            )));
        }

        let status = parse_printer_status(response.attributes())?;
        debug!(state = %status.state, reasons = status.reasons.len(), "received printer status");
        Ok(status)
    }

    /// Submit a document to the printer as a Print-Job.
    #[instrument(
        skip(self, connection, document),
        fields(uri = %connection.printer_uri(), job_name = %metadata.job_name, bytes = document.len())
    )]
    async fn submit_job(
        &self,
        connection: &ConnectionConfig,
        document: Vec<u8>,
        metadata: &JobMetadata,
    ) -> Result<()> {
        let uri = parse_uri(connection)?;
        let payload = IppPayload::new(Cursor::new(document));

        let operation = IppOperationBuilder::print_job(uri.clone(), payload)
            .user_name(&metadata.requesting_user)
            .job_title(&metadata.job_name)
            .document_format(&metadata.document_format)
            .build();
        let client = self.build(connection, uri);

        info!(mime = %metadata.document_format, "sending Print-Job");
        let response = client
            .send(operation)
            .await
            .map_err(|e| MonitorError::Connection(format!("Print-Job: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "Print-Job failed");
            return Err(MonitorError::Protocol(format!(
                "Print-Job returned status {code:?}"
            )));
        }

        match extract_job_id(response.attributes()) {
            Some(job_id) => info!(job_id, "print job accepted by printer"),
            None => info!("print job accepted by printer"),
        }
        Ok(())
    }

    /// List the queues on a CUPS server.
    #[instrument(skip(self, connection), fields(host = %connection.host))]
    async fn list_queues(&self, connection: &ConnectionConfig) -> Result<Vec<DiscoveredQueue>> {
        let root = connection.server_root();
        let uri = parse_uri(&root)?;
        let operation = IppOperationBuilder::cups().get_printers();
        let client = self.build(&root, uri);

        debug!("sending CUPS-Get-Printers");
        let response = client
            .send(operation)
            .await
            .map_err(|e| MonitorError::Connection(format!("CUPS-Get-Printers: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "CUPS-Get-Printers failed");
            return Err(MonitorError::Protocol(format!(
                "CUPS-Get-Printers returned status {code:?}"
            )));
        }

        let queues = parse_queues(response.attributes());
        debug!(count = queues.len(), "received queue list");
        Ok(queues)
    }
}

// ---------------------------------------------------------------------------
// Helper functions for parsing IPP responses
// ---------------------------------------------------------------------------

/// Build a [`PrinterStatus`] from the first Printer Attributes group.
fn parse_printer_status(attrs: &IppAttributes) -> Result<PrinterStatus> {
    let group = attrs
        .groups_of(DelimiterTag::PrinterAttributes)
        .next()
        .ok_or_else(|| MonitorError::Protocol("response has no printer attributes".into()))?;
    let attributes = group.attributes();

    Ok(status_from_values(
        attributes.get("printer-state").map(|a| a.value()),
        attributes.get("printer-state-message").map(|a| a.value()),
        attributes.get("printer-state-reasons").map(|a| a.value()),
    ))
}

fn status_from_values(
    state: Option<&IppValue>,
    message: Option<&IppValue>,
    reasons: Option<&IppValue>,
) -> PrinterStatus {
    let state = match state {
        Some(IppValue::Enum(v)) | Some(IppValue::Integer(v)) => PrinterState::from_ipp_enum(*v),
        _ => PrinterState::Unknown,
    };

    let message = message.map(value_text);

    let mut reasons: Vec<String> = match reasons {
        Some(IppValue::Array(values)) => values.iter().map(value_text).collect(),
        Some(value) => vec![value_text(value)],
        None => Vec::new(),
    };
    // "none" is the keyword for an empty reason set.
    reasons.retain(|reason| reason != "none");

    PrinterStatus::new(state, message, reasons)
}

fn value_text(value: &IppValue) -> String {
    match value {
        IppValue::Keyword(s)
        | IppValue::TextWithoutLanguage(s)
        | IppValue::NameWithoutLanguage(s)
        | IppValue::Uri(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Extract the `job-id` integer from a response's Job Attributes group.
fn extract_job_id(attrs: &IppAttributes) -> Option<i32> {
    for group in attrs.groups_of(DelimiterTag::JobAttributes) {
        if let Some(attr) = group.attributes().get("job-id")
            && let IppValue::Integer(id) = attr.value()
        {
            return Some(*id);
        }
    }
    None
}

/// One queue per Printer Attributes group; groups without a name are skipped.
fn parse_queues(attrs: &IppAttributes) -> Vec<DiscoveredQueue> {
    attrs
        .groups_of(DelimiterTag::PrinterAttributes)
        .filter_map(|group| {
            let attributes = group.attributes();
            let name = attributes.get("printer-name").map(|a| value_text(a.value()))?;
            let uri = attributes
                .get("printer-uri-supported")
                .map(|a| match a.value() {
                    IppValue::Array(values) => values.first().map(value_text).unwrap_or_default(),
                    other => value_text(other),
                })
                .filter(|uri| !uri.is_empty());
            Some(DiscoveredQueue { name, uri })
        })
        .collect()
}
