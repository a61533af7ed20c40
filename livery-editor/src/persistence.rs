//! Single-slot persistence of the serialized surface.
//!
//! The saved value is the same SVG string that feeds the texture, so a saved
//! surface can be shown before anything is parsed back. Failures never reach
//! the caller: saves report `false`, loads report absence.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::StorageError;

/// Key of the single saved slot.
pub const STORAGE_KEY: &str = "robot-painting-texture-svg";

/// Key-value backend for saved slots.
pub trait SlotStorage {
    /// Read a slot. `Ok(None)` when nothing was saved under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite a slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be stored.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileSlotStorage {
    data_dir: PathBuf,
}

impl FileSlotStorage {
    /// Store slots under `data_dir`. The directory is created if it doesn't
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.svg", sanitize_filename(key)))
    }
}

impl SlotStorage for FileSlotStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("svg.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory slots with an optional byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStorage {
    slots: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemorySlotStorage {
    /// Unbounded storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes pushing the total past `bytes`.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            slots: HashMap::new(),
            quota: Some(bytes),
        }
    }
}

impl SlotStorage for MemorySlotStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let others: usize = self
                .slots
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let available = quota.saturating_sub(others);
            if value.len() > available {
                return Err(StorageError::QuotaExceeded {
                    needed: value.len(),
                    available,
                });
            }
        }
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Saves and restores the serialized surface under [`STORAGE_KEY`].
pub struct PersistenceAdapter {
    storage: Box<dyn SlotStorage + Send>,
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter").finish_non_exhaustive()
    }
}

impl PersistenceAdapter {
    /// Persist through `storage`.
    pub fn new(storage: impl SlotStorage + Send + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    /// Persist in memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemorySlotStorage::new())
    }

    /// Overwrite the saved slot. Returns `false` (after logging) on failure.
    pub fn save(&mut self, svg: &str) -> bool {
        match self.storage.write(STORAGE_KEY, svg) {
            Ok(()) => {
                tracing::info!(bytes = svg.len(), "Saved surface");
                true
            }
            Err(e) => {
                tracing::warn!("Failed to save surface: {e}");
                false
            }
        }
    }

    /// Read the saved slot. Unreadable storage loads as absent.
    #[must_use]
    pub fn load(&self) -> Option<String> {
        match self.storage.read(STORAGE_KEY) {
            Ok(Some(svg)) if !svg.trim().is_empty() => Some(svg),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Failed to read saved surface: {e}");
                None
            }
        }
    }
}

/// Sanitize a slot key for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
