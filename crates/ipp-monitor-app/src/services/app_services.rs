// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: builds one entry, coordinator and poller per
// configured printer, owns the job submitter and the upload scratch
// directory, and keeps the persisted config in step with option changes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{info, warn};

use ipp_monitor_core::AppConfig;
use ipp_monitor_core::error::{MonitorError, Result};
use ipp_monitor_core::types::{EntityId, EntryId, JobRecord};
use ipp_monitor_print::client::PrinterClient;
use ipp_monitor_print::poller::Poller;
use ipp_monitor_print::registry::{EntityResolver, EntryRegistry, PrinterEntry};
use ipp_monitor_print::submitter::JobSubmitter;

use super::data_dir;
use super::upload::PendingUpload;
use crate::entities::{self, EntityState};

/// Shared application services.
///
/// All fields are cheaply cloneable (Arc-wrapped) so the struct can be handed
/// to every request handler.
#[derive(Clone)]
pub struct AppServices {
    registry: Arc<EntryRegistry>,
    submitter: Arc<JobSubmitter>,
    pollers: Arc<tokio::sync::Mutex<Vec<Poller>>>,
    upload_dir: PathBuf,
    config: Arc<Mutex<AppConfig>>,
    /// Where option changes are persisted; `None` keeps them in memory.
    config_path: Option<PathBuf>,
}

impl AppServices {
    /// Set up every configured printer and start polling.
    ///
    /// Returns once each printer has completed its first refresh (successful
    /// or not).
    pub async fn start(
        config: AppConfig,
        config_path: Option<PathBuf>,
        client: Arc<dyn PrinterClient>,
    ) -> Result<Self> {
        config.validate()?;

        let upload_dir = data_dir::upload_dir(config.upload_dir.as_deref(), config_path.as_deref());
        tokio::fs::create_dir_all(&upload_dir).await?;
        let upload_dir = tokio::fs::canonicalize(&upload_dir).await?;
        info!(path = %upload_dir.display(), "upload directory ready");

        let registry = Arc::new(EntryRegistry::new());
        let submitter = Arc::new(JobSubmitter::new(registry.clone(), Arc::clone(&client)));
        let interval = Duration::from_secs(config.poll_interval_secs);

        let mut pollers = Vec::with_capacity(config.printers.len());
        for printer in &config.printers {
            let entry = Arc::new(PrinterEntry::from_config(printer, Arc::clone(&client)));
            registry.add_entry(Arc::clone(&entry));
            for entity_id in entities::entity_ids(&entry) {
                if registry.resolve(&entity_id).is_ok() {
                    return Err(MonitorError::Config(format!(
                        "printer '{}' clashes with another printer's entity {entity_id}",
                        printer.name
                    )));
                }
                registry.bind_entity(entity_id, entry.id)?;
            }
            pollers.push(Poller::start(Arc::clone(&entry.coordinator), interval).await);
        }

        info!(printers = pollers.len(), "app services initialised");

        Ok(Self {
            registry,
            submitter,
            pollers: Arc::new(tokio::sync::Mutex::new(pollers)),
            upload_dir,
            config: Arc::new(Mutex::new(config)),
            config_path,
        })
    }

    /// Stop every poller.
    pub async fn shutdown(&self) {
        let mut pollers = self.pollers.lock().await;
        for poller in pollers.iter_mut() {
            if let Err(e) = poller.stop().await {
                warn!(error = %e, "poller did not stop cleanly");
            }
        }
        pollers.clear();
        info!("app services stopped");
    }

    pub fn registry(&self) -> &Arc<EntryRegistry> {
        &self.registry
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Copy of the current config.
    pub fn config(&self) -> AppConfig {
        self.lock_config().clone()
    }

    pub fn api_token(&self) -> Option<String> {
        self.lock_config().api_token.clone()
    }

    // -- Uploads -------------------------------------------------------------

    /// Start storing an uploaded PDF in the upload directory.
    pub async fn begin_upload(&self, filename: &str) -> Result<PendingUpload> {
        PendingUpload::create(&self.upload_dir, filename).await
    }

    // -- Printing ------------------------------------------------------------

    /// Print an uploaded PDF on the printer behind `entity_id`.
    ///
    /// Only files directly inside the upload directory are accepted; the
    /// submitter deletes the file it prints.
    pub async fn print_pdf(&self, entity_id: &EntityId, file_path: &Path) -> Result<JobRecord> {
        let upload = self.resolve_upload(file_path).await?;
        self.submitter.print_pdf(entity_id, &upload).await
    }

    async fn resolve_upload(&self, file_path: &Path) -> Result<PathBuf> {
        let canonical = tokio::fs::canonicalize(file_path)
            .await
            .map_err(|_| MonitorError::FileNotFound(file_path.to_path_buf()))?;
        if canonical.parent() != Some(self.upload_dir.as_path()) {
            warn!(path = %file_path.display(), "refusing to print a file outside the upload directory");
            return Err(MonitorError::InvalidRequest(
                "File is not in the upload directory".into(),
            ));
        }
        Ok(canonical)
    }

    // -- Options -------------------------------------------------------------

    /// Change an entry's simulation option and persist it.
    pub fn set_simulation_mode(&self, entry_id: EntryId, enabled: bool) -> Result<()> {
        self.registry.set_simulation_mode(entry_id, enabled)?;

        let mut config = self.lock_config();
        if let Some(printer) = config.printers.iter_mut().find(|p| p.id == entry_id) {
            printer.simulation_mode = enabled;
        }
        if let Some(path) = &self.config_path {
            config.persist(path)?;
        }
        Ok(())
    }

    // -- Entities ------------------------------------------------------------

    /// Every entity of every entry.
    pub fn states(&self) -> Vec<EntityState> {
        self.registry
            .entries()
            .iter()
            .flat_map(|entry| entities::render(entry))
            .collect()
    }

    /// One entity, `None` if unknown.
    pub fn state(&self, entity_id: &EntityId) -> Option<EntityState> {
        let entry = self.registry.resolve(entity_id).ok()?;
        entities::render(&entry)
            .into_iter()
            .find(|s| &s.entity_id == entity_id)
    }

    fn lock_config(&self) -> std::sync::MutexGuard<'_, AppConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
