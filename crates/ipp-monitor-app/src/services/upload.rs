// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Uploaded PDFs being written to the scratch directory.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use ipp_monitor_core::error::{MonitorError, Result};

/// An upload written chunk by chunk.  The partial file is removed if the
/// upload is dropped before `finish`.
pub struct PendingUpload {
    path: PathBuf,
    file: File,
    bytes: u64,
    finished: bool,
}

impl PendingUpload {
    /// Create `{uuid}_{name}` in `dir`.
    ///
    /// Only the final component of `filename` is kept, and it must end in
    /// `.pdf` (any case).
    pub(crate) async fn create(dir: &Path, filename: &str) -> Result<Self> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| MonitorError::InvalidRequest("No file uploaded".into()))?;
        if !name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(MonitorError::InvalidRequest(
                "Only PDF files are allowed".into(),
            ));
        }

        let path = dir.join(format!("{}_{name}", Uuid::new_v4()));
        let file = File::create_new(&path).await?;
        Ok(Self {
            path,
            file,
            bytes: 0,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.file.write_all(chunk).await?;
        self.bytes += chunk.len() as u64;
        Ok(())
    }

    /// Flush to disk and hand back the stored path.
    pub async fn finish(mut self) -> Result<PathBuf> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        self.finished = true;
        info!(path = %self.path.display(), bytes = self.bytes, "upload stored");
        Ok(self.path.clone())
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => warn!(path = %self.path.display(), "incomplete upload discarded"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove incomplete upload"),
        }
    }
}
