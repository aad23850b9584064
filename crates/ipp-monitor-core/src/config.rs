// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration, persisted as JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MonitorError, Result};
use crate::types::{ConnectionConfig, EntryId};

/// Persistent service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Seconds between status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Scratch directory for uploaded PDFs.  Defaults to a subdirectory of
    /// the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_dir: Option<PathBuf>,
    /// Bearer token required on every API request, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Configured printers, one coordinator each.
    #[serde(default)]
    pub printers: Vec<PrinterEntryConfig>,
}

/// One configured printer queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterEntryConfig {
    /// Stable entry id.  Generated and written back on first load when absent.
    #[serde(default)]
    pub id: EntryId,
    /// Queue name, also used as the entry title.
    pub name: String,
    pub connection: ConnectionConfig,
    /// Skip the network call on submission and only record the job.
    #[serde(default)]
    pub simulation_mode: bool,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8631".into()
}

fn default_poll_interval() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            poll_interval_secs: default_poll_interval(),
            upload_dir: None,
            api_token: None,
            printers: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read a config file.  A missing file yields the defaults.
    ///
    /// Printers written without an `id` get one, and the file is rewritten so
    /// the id survives restarts.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let raw: Value = serde_json::from_str(&data)?;
        let missing_ids = raw
            .get("printers")
            .and_then(Value::as_array)
            .is_some_and(|printers| printers.iter().any(|p| p.get("id").is_none()));

        let config: Self = serde_json::from_value(raw)?;
        config.validate()?;
        if missing_ids {
            config.persist(path)?;
        }
        Ok(config)
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(MonitorError::Config(
                "poll_interval_secs must be greater than zero".into(),
            ));
        }
        for printer in &self.printers {
            if printer.name.trim().is_empty() {
                return Err(MonitorError::Config("printer name must not be empty".into()));
            }
            if printer.connection.host.trim().is_empty() {
                return Err(MonitorError::Config(format!(
                    "printer '{}' has no host",
                    printer.name
                )));
            }
        }
        let mut names: Vec<&str> = self.printers.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(MonitorError::Config(format!(
                "printer '{}' is configured twice",
                dup[0]
            )));
        }
        Ok(())
    }
}
