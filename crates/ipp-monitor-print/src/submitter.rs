// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF job submission.
//
// A submission takes ownership of an uploaded file.  Once the preconditions
// pass (the file is readable and the entity is bound), the outcome is
// recorded on the printer's coordinator exactly once and the file is deleted
// exactly once, whether the print succeeded, failed or was simulated.  A
// future dropped half way records nothing but still deletes the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use ipp_monitor_core::error::{MonitorError, Result};
use ipp_monitor_core::types::{EntityId, JobMetadata, JobOutcome, JobRecord};

use crate::client::PrinterClient;
use crate::registry::{EntityResolver, PrinterEntry};

/// Prints uploaded PDFs on the printer bound to an entity.
pub struct JobSubmitter {
    resolver: Arc<dyn EntityResolver>,
    client: Arc<dyn PrinterClient>,
    metadata: JobMetadata,
}

impl JobSubmitter {
    pub fn new(resolver: Arc<dyn EntityResolver>, client: Arc<dyn PrinterClient>) -> Self {
        Self {
            resolver,
            client,
            metadata: JobMetadata::pdf(),
        }
    }

    /// Print `file_path` on the printer behind `entity_id`.
    ///
    /// Returns the committed record on success or simulation.  A failed
    /// print is still committed (as `failed`) before `PrintFailed` is
    /// returned.  Precondition errors commit nothing and leave the file
    /// alone.
    #[instrument(skip(self), fields(entity_id = %entity_id, path = %file_path.display()))]
    pub async fn print_pdf(&self, entity_id: &EntityId, file_path: &Path) -> Result<JobRecord> {
        SourceFile::check(file_path).await?;
        let entry = self.resolver.resolve(entity_id)?;
        let source = SourceFile::claim(file_path);

        let simulate = entry.simulation_mode();
        let outcome = if simulate {
            info!(printer = %entry.title, "simulation mode, skipping print");
            Ok(JobOutcome::Simulated)
        } else {
            self.send(&entry, source.path()).await.map(|()| JobOutcome::Success)
        };

        let status = match &outcome {
            Ok(status) => *status,
            Err(_) => JobOutcome::Failed,
        };
        let record = JobRecord::now(entity_id.clone(), file_path.to_path_buf(), status);
        entry.coordinator.record_job(record.clone());
        source.remove().await;

        match outcome {
            Ok(_) => Ok(record),
            Err(e) => {
                error!(printer = %entry.title, error = %e, "print failed");
                Err(MonitorError::print_failed(e))
            }
        }
    }

    async fn send(&self, entry: &PrinterEntry, path: &Path) -> Result<()> {
        let document = tokio::fs::read(path).await?;
        let size = document.len();
        self.client
            .submit_job(&entry.connection, document, &self.metadata)
            .await?;
        info!(printer = %entry.title, bytes = size, "print job submitted");
        Ok(())
    }
}

/// An uploaded file owned by one submission.  Deleted when dropped unless
/// `remove` already ran.
struct SourceFile {
    path: PathBuf,
    armed: bool,
}

impl SourceFile {
    /// `FileNotFound` unless `path` is a readable regular file.
    async fn check(path: &Path) -> Result<()> {
        let not_found = || MonitorError::FileNotFound(path.to_path_buf());
        let meta = tokio::fs::metadata(path).await.map_err(|_| not_found())?;
        if !meta.is_file() {
            return Err(not_found());
        }
        tokio::fs::File::open(path).await.map_err(|_| not_found())?;
        Ok(())
    }

    fn claim(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn remove(mut self) {
        self.armed = false;
        log_cleanup(&self.path, tokio::fs::remove_file(&self.path).await);
    }
}

impl Drop for SourceFile {
    fn drop(&mut self) {
        if self.armed {
            log_cleanup(&self.path, std::fs::remove_file(&self.path));
        }
    }
}

fn log_cleanup(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => {}
        // Someone else already removed it.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove uploaded file"),
    }
}
