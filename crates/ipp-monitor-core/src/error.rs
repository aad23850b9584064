// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ipp-monitor.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all ipp-monitor operations.
#[derive(Debug, Error)]
pub enum MonitorError {
    // -- Printer errors --
    #[error("cannot connect to printer: {0}")]
    Connection(String),

    #[error("IPP request failed: {0}")]
    Protocol(String),

    #[error("no printers found on the server")]
    NoPrintersFound,

    // -- Submission errors --
    #[error("entity {0} is not linked to a configured printer")]
    EntityNotBound(String),

    #[error("printer entry not found: {0}")]
    EntryNotFound(String),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to print: {source}")]
    PrintFailed {
        #[source]
        source: Box<MonitorError>,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // -- Service / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MonitorError {
    /// Wrap a submission failure so the caller sees the underlying cause.
    pub fn print_failed(source: MonitorError) -> Self {
        Self::PrintFailed {
            source: Box::new(source),
        }
    }

    /// Whether this error came from talking to the printer (as opposed to
    /// local validation or I/O).
    pub fn is_printer_error(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Protocol(_) | Self::NoPrintersFound => true,
            Self::PrintFailed { source } => source.is_printer_error(),
            _ => false,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_failed_message_includes_cause() {
        let err = MonitorError::print_failed(MonitorError::Connection("connection refused".into()));
        assert_eq!(
            err.to_string(),
            "Failed to print: cannot connect to printer: connection refused"
        );
    }

    #[test]
    fn printer_errors_are_classified() {
        assert!(MonitorError::Protocol("bad".into()).is_printer_error());
        assert!(
            MonitorError::print_failed(MonitorError::Connection("x".into())).is_printer_error()
        );
        assert!(!MonitorError::FileNotFound("/tmp/x.pdf".into()).is_printer_error());
        assert!(!MonitorError::print_failed(MonitorError::Io(std::io::Error::other("disk")))
            .is_printer_error());
    }
}
