//! Local filesystem state store.
//!
//! ## Save protocol
//!
//! 1. Copy the existing state file to `<file>.bak`.
//! 2. Write the new state over the primary file.
//! 3. If the write fails, copy the backup back over the primary (or remove
//!    the partial file when there was no previous state) and return the error.

use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::MonitorState;
use crate::storage::StateStore;

/// JSON state file with a sibling backup.
#[derive(Debug, Clone)]
pub struct LocalStateStore {
    path: PathBuf,
    backup_path: PathBuf,
}

impl LocalStateStore {
    /// Create a store for the given state file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut backup: OsString = path.clone().into_os_string();
        backup.push(".bak");
        Self {
            path,
            backup_path: PathBuf::from(backup),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Read and parse the state file, `None` if it does not exist.
    pub async fn read_state(&self) -> Result<Option<MonitorState>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Run the backup/write/restore protocol with a custom primary writer.
    async fn save_with<F, Fut>(&self, bytes: Vec<u8>, write: F) -> Result<()>
    where
        F: FnOnce(PathBuf, Vec<u8>) -> Fut,
        Fut: Future<Output = io::Result<()>>,
    {
        self.ensure_dir().await?;

        let had_primary = tokio::fs::try_exists(&self.path).await?;
        if had_primary {
            tokio::fs::copy(&self.path, &self.backup_path).await?;
        }

        match write(self.path.clone(), bytes).await {
            Ok(()) => {
                log::info!("[state] Saved to {}", self.path.display());
                Ok(())
            }
            Err(e) => {
                log::error!("[state] Write to {} failed: {}", self.path.display(), e);
                if had_primary {
                    match tokio::fs::copy(&self.backup_path, &self.path).await {
                        Ok(_) => log::warn!(
                            "[state] Restored {} from {}",
                            self.path.display(),
                            self.backup_path.display()
                        ),
                        Err(restore) => log::error!("[state] Restore failed: {}", restore),
                    }
                } else if let Err(remove) = tokio::fs::remove_file(&self.path).await {
                    if remove.kind() != io::ErrorKind::NotFound {
                        log::error!("[state] Could not remove partial file: {}", remove);
                    }
                }
                Err(AppError::Io(e))
            }
        }
    }
}

/// Write bytes to `path`, flushed and synced.
async fn write_file(path: PathBuf, bytes: Vec<u8>) -> io::Result<()> {
    let mut file = tokio::fs::File::create(&path).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self) -> MonitorState {
        match self.read_state().await {
            Ok(Some(state)) => {
                log::info!(
                    "[state] Loaded {} item(s) across {} keyword(s) from {}",
                    state.item_count(),
                    state.keywords.len(),
                    self.path.display()
                );
                state
            }
            Ok(None) => {
                log::warn!(
                    "[state] {} not found, starting with empty state",
                    self.path.display()
                );
                MonitorState::default()
            }
            Err(e) => {
                log::warn!(
                    "[state] Failed to read {}: {}. Starting with empty state",
                    self.path.display(),
                    e
                );
                MonitorState::default()
            }
        }
    }

    async fn save(&self, state: &MonitorState) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(state)?;
        bytes.push(b'\n');
        self.save_with(bytes, write_file).await
    }
}
