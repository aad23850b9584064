// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language error messages for API responses.
//
// The technical `MonitorError` text is always kept (it carries the cause); the
// human form adds a short headline and something the caller can try.

use serde::Serialize;

use crate::error::MonitorError;

/// Severity of an error from the caller's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Network blip or busy printer; trying again may work.
    Transient,
    /// The caller has to fix something (wrong entity, missing file, paper).
    ActionRequired,
    /// Retrying the same request will not help.
    Permanent,
}

/// A human-readable error with a plain message and a suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    fn new(message: &str, suggestion: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable: severity == Severity::Transient,
            severity,
        }
    }
}

/// Convert a `MonitorError` into a `HumanError`.
pub fn humanize_error(err: &MonitorError) -> HumanError {
    match err {
        MonitorError::Connection(detail) => humanize_connection_error(detail),
        MonitorError::Protocol(detail) => humanize_ipp_error(detail),
        MonitorError::PrintFailed { source } => humanize_error(source),

        MonitorError::NoPrintersFound => HumanError::new(
            "The print server has no printers.",
            "Add a printer queue on the CUPS server, or check the host and port.",
            Severity::ActionRequired,
        ),

        MonitorError::EntityNotBound(entity) => HumanError::new(
            "That entity is not one of our printers.",
            format!("Use the status entity of a configured printer instead of {entity}."),
            Severity::ActionRequired,
        ),

        MonitorError::EntryNotFound(_) => HumanError::new(
            "That printer is not configured.",
            "List the configured printers and use one of their ids.",
            Severity::ActionRequired,
        ),

        MonitorError::FileNotFound(path) => HumanError::new(
            "The file to print could not be found.",
            format!(
                "Upload the PDF again and use the returned path. ({})",
                path.display()
            ),
            Severity::ActionRequired,
        ),

        MonitorError::InvalidRequest(detail) => HumanError::new(
            "The request was incomplete.",
            format!("Check the request fields and try again. ({detail})"),
            Severity::Permanent,
        ),

        MonitorError::Config(detail) => HumanError::new(
            "The service configuration is invalid.",
            format!("Fix the configuration file and restart. ({detail})"),
            Severity::Permanent,
        ),

        MonitorError::Server(_) => HumanError::new(
            "The service had an internal problem.",
            "Try again. If this keeps happening, check the service log.",
            Severity::Transient,
        ),

        MonitorError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError::new(
                "The file could not be found.",
                "It may have been printed and removed already. Upload it again.",
                Severity::ActionRequired,
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::new(
                "The service may not read or write that file.",
                "Check the permissions of the upload directory.",
                Severity::ActionRequired,
            ),
            _ => HumanError::new(
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, the disk may be full.",
                Severity::Transient,
            ),
        },

        MonitorError::Serialization(_) => HumanError::new(
            "The service had an internal data problem.",
            "Try again. If this keeps happening, please report it.",
            Severity::Transient,
        ),
    }
}

fn humanize_connection_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("timed out") {
        HumanError::new(
            "The printer didn't respond in time.",
            "The printer might be busy or turned off. Check it's on, then try again.",
            Severity::Transient,
        )
    } else if lower.contains("certificate") || lower.contains("tls") {
        HumanError::new(
            "The printer's secure connection could not be verified.",
            "Disable TLS verification for this printer if it uses a self-signed certificate.",
            Severity::ActionRequired,
        )
    } else {
        HumanError::new(
            "We couldn't reach the printer.",
            format!("Check the host, port and network, then try again. (Detail: {detail})"),
            Severity::Transient,
        )
    }
}

/// Map IPP status details and printer-state-reasons keywords.
///
/// Status codes arrive either as keywords (`client-error-not-found`) or as
/// Debug-formatted variants (`ClientErrorNotFound`), so both are folded to
/// bare lowercase alphanumerics before matching.
fn humanize_ipp_error(detail: &str) -> HumanError {
    let lower: String = detail
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if lower.contains("notauthorized") || lower.contains("notauthenticated") || lower.contains("forbidden") {
        HumanError::new(
            "The printer rejected our credentials.",
            "Check the username and password configured for this printer.",
            Severity::ActionRequired,
        )
    } else if lower.contains("clienterrordocumentformat") {
        HumanError::new(
            "The printer doesn't accept PDF documents.",
            "Convert the document for this printer or print through a CUPS queue.",
            Severity::Permanent,
        )
    } else if lower.contains("clienterrornotfound") {
        HumanError::new(
            "The printer queue does not exist.",
            "Check the queue name; it may have been renamed on the server.",
            Severity::ActionRequired,
        )
    } else if lower.contains("mediaempty") {
        HumanError::new(
            "The printer is out of paper.",
            "Add paper to the tray, then print again.",
            Severity::ActionRequired,
        )
    } else if lower.contains("mediajam") || lower.contains("paperjam") {
        HumanError::new(
            "Paper is stuck in the printer.",
            "Clear the jam and close all doors, then print again.",
            Severity::ActionRequired,
        )
    } else if lower.contains("servererror") {
        HumanError::new(
            "The printer reported an internal error.",
            "Try turning the printer off and on again.",
            Severity::Transient,
        )
    } else {
        HumanError::new(
            "The printer had a problem.",
            format!("Try again. (Detail: {detail})"),
            Severity::Transient,
        )
    }
}
