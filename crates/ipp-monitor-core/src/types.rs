// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for ipp-monitor.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default IANA port for IPP.
pub const DEFAULT_IPP_PORT: u16 = 631;

/// Unique identifier for one configured printer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifier of a presentation entity, e.g. `sensor.office_status`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// IPP `printer-state` (RFC 8011 §5.4.11), collapsed to what we display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterState {
    Idle,
    Processing,
    Stopped,
    Unknown,
}

impl PrinterState {
    /// Map the IPP enum value: 3 idle, 4 processing, 5 stopped.
    pub fn from_ipp_enum(value: i32) -> Self {
        match value {
            3 => Self::Idle,
            4 => Self::Processing,
            5 => Self::Stopped,
            _ => Self::Unknown,
        }
    }

    /// Keyword used as the entity state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PrinterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the printer's state at the time of a poll.
///
/// Replaced wholesale on every successful poll, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterStatus {
    pub state: PrinterState,
    /// `printer-state-message`, if the printer sent a non-empty one.
    pub message: Option<String>,
    /// `printer-state-reasons` in the order the printer reported them.
    pub reasons: Vec<String>,
}

impl PrinterStatus {
    pub fn new(state: PrinterState, message: Option<String>, reasons: Vec<String>) -> Self {
        Self {
            state,
            message: message.filter(|m| !m.is_empty()),
            reasons,
        }
    }
}

/// Outcome of a print submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobOutcome {
    Success,
    Simulated,
    Failed,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Simulated => "simulated",
            Self::Failed => "failed",
        }
    }
}

/// Record of the most recent print submission for a printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub entity_id: EntityId,
    pub file_path: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub status: JobOutcome,
}

impl JobRecord {
    /// Build a record stamped with the current time.
    pub fn now(entity_id: EntityId, file_path: PathBuf, status: JobOutcome) -> Self {
        Self {
            entity_id,
            file_path,
            timestamp: Utc::now(),
            status,
        }
    }
}

/// Everything the coordinator knows about one printer.
///
/// `status` is `None` until the first successful poll, `last_job` is `None`
/// until the first submission.  The two halves are independent facts and may
/// come from different points in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorState {
    pub status: Option<PrinterStatus>,
    pub last_job: Option<JobRecord>,
}

/// How to reach one printer.  Immutable for the lifetime of an entry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Resource path on the server, e.g. `/printers/Office`.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default)]
    pub tls: bool,
    #[serde(default = "default_true")]
    pub verify_tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_IPP_PORT
}

fn default_base_path() -> String {
    "/".into()
}

fn default_true() -> bool {
    true
}

impl ConnectionConfig {
    /// Connection to `host` on the default port, plain IPP, server root.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_IPP_PORT,
            base_path: default_base_path(),
            tls: false,
            verify_tls: true,
            username: None,
            password: None,
        }
    }

    /// Copy of this connection pointed at a CUPS queue.
    pub fn for_queue(&self, queue_name: &str) -> Self {
        Self {
            base_path: format!("/printers/{queue_name}"),
            ..self.clone()
        }
    }

    /// Copy of this connection pointed at the server root (for listing queues).
    pub fn server_root(&self) -> Self {
        Self {
            base_path: default_base_path(),
            ..self.clone()
        }
    }

    /// `ipp://` or `ipps://` URI for this connection.
    pub fn printer_uri(&self) -> String {
        let scheme = if self.tls { "ipps" } else { "ipp" };
        let path = if self.base_path.starts_with('/') {
            self.base_path.clone()
        } else {
            format!("/{}", self.base_path)
        };
        format!("{scheme}://{}:{}{path}", self.host, self.port)
    }

    /// Web interface URL of a CUPS queue, shown as device info.
    pub fn configuration_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.base_path)
    }

    /// Basic-auth pair when a username is set.  A missing password is sent
    /// as empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let user = self.username.as_deref()?;
        Some((user, self.password.as_deref().unwrap_or("")))
    }
}

// Keep passwords out of logs.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_path", &self.base_path)
            .field("tls", &self.tls)
            .field("verify_tls", &self.verify_tls)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A print queue listed by a CUPS server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredQueue {
    /// `printer-name`.
    pub name: String,
    /// `printer-uri-supported`, if reported.
    pub uri: Option<String>,
}

/// Metadata sent alongside a document in a Print-Job request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMetadata {
    pub job_name: String,
    pub document_format: String,
    pub requesting_user: String,
}

impl JobMetadata {
    /// The fixed metadata used for every PDF submission.
    pub fn pdf() -> Self {
        Self {
            job_name: "Attendance Doc".into(),
            document_format: "application/pdf".into(),
            requesting_user: "ipp-monitor".into(),
        }
    }
}

/// Turn a printer title into an entity-id-safe slug (`Office Laser` →
/// `office_laser`).
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_underscore = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore {
            slug.push('_');
            last_underscore = true;
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("printer");
    }
    slug
}
