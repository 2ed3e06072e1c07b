// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON file store for the persisted snapshot.
//!
//! Writes go to a sibling temp file which is then renamed over the target,
//! so a crash mid-write leaves the previous snapshot intact.

use crate::models::Snapshot;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Snapshot storage.
#[derive(Clone)]
pub struct JsonStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    File(PathBuf),
    Memory(Arc<Mutex<Option<String>>>),
}

impl JsonStore {
    /// Store backed by `path`. The parent directory is created on first save.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            backend: Backend::File(path.as_ref().to_path_buf()),
        }
    }

    /// In-memory store for testing.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(Mutex::new(None))),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::File(path) => Some(path),
            Backend::Memory(_) => None,
        }
    }

    /// Load the snapshot, substituting an empty one for missing or corrupt data.
    pub fn load(&self) -> Snapshot {
        match self.try_load() {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    revealed = snapshot.revealed.len(),
                    runs = snapshot.runs.len(),
                    unlocked = snapshot.unlocked.len(),
                    "Loaded snapshot"
                );
                snapshot
            }
            Ok(None) => {
                tracing::info!("No snapshot found, starting fresh");
                Snapshot::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot unreadable, starting fresh");
                Snapshot::default()
            }
        }
    }

    /// Strict load: `Ok(None)` when nothing has been saved yet.
    pub fn try_load(&self) -> Result<Option<Snapshot>, StoreError> {
        let raw = match &self.backend {
            Backend::File(path) => match fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(StoreError::Io(e.to_string())),
            },
            Backend::Memory(slot) => match slot.lock().map_err(|_| StoreError::Poisoned)?.clone() {
                Some(raw) => raw,
                None => return Ok(None),
            },
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let raw = serde_json::to_string(snapshot).map_err(|e| StoreError::Encode(e.to_string()))?;
        match &self.backend {
            Backend::File(path) => write_atomic(path, &raw),
            Backend::Memory(slot) => {
                *slot.lock().map_err(|_| StoreError::Poisoned)? = Some(raw);
                Ok(())
            }
        }
    }
}

fn write_atomic(path: &Path, raw: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, raw).map_err(|e| StoreError::Io(e.to_string()))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::Io(e.to_string()))
}

/// Errors from snapshot storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Stored snapshot is corrupt: {0}")]
    Corrupt(String),

    #[error("Failed to encode snapshot: {0}")]
    Encode(String),

    #[error("In-memory store lock poisoned")]
    Poisoned,
}
