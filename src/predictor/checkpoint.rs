//! Weight checkpoints
//!
//! A checkpoint is a single libtorch weights file at a fixed path. Saving
//! writes a sibling temporary file first and renames it over the target, so
//! a crash mid-save never leaves a truncated checkpoint and only the most
//! recent weights exist on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::PolicyNet;
use crate::error::{CheckpointError, CheckpointResult};

/// Where network weights are persisted between runs
pub trait CheckpointStore {
    /// Load saved weights into `net`; `Ok(false)` when no checkpoint exists yet
    fn load_into(&self, net: &mut PolicyNet) -> CheckpointResult<bool>;

    /// Overwrite the checkpoint with the current weights of `net`
    fn save(&mut self, net: &PolicyNet) -> CheckpointResult<()>;
}

/// Checkpoint stored as one file on the local filesystem
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CheckpointStore for FileCheckpoint {
    fn load_into(&self, net: &mut PolicyNet) -> CheckpointResult<bool> {
        if !self.path.exists() {
            info!(
                "[CHECKPOINT] No checkpoint at {:?}, starting from fresh weights",
                self.path
            );
            return Ok(false);
        }
        net.var_store_mut()
            .load(&self.path)
            .map_err(|source| CheckpointError::Torch {
                path: self.path.clone(),
                source,
            })?;
        info!("[CHECKPOINT] Loaded weights from {:?}", self.path);
        Ok(true)
    }

    fn save(&mut self, net: &PolicyNet) -> CheckpointResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| CheckpointError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let temp = self.temp_path();
        net.var_store()
            .save(&temp)
            .map_err(|source| CheckpointError::Torch {
                path: temp.clone(),
                source,
            })?;

        if let Err(source) = fs::rename(&temp, &self.path) {
            if let Err(e) = fs::remove_file(&temp) {
                warn!("[CHECKPOINT] Failed to remove {:?}: {}", temp, e);
            }
            return Err(CheckpointError::Io {
                path: self.path.clone(),
                source,
            });
        }

        info!("[CHECKPOINT] Saved weights to {:?}", self.path);
        Ok(())
    }
}
