//! Key-value backends for the profile blob

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("no storage backend available")]
    Unavailable,
    #[error("storage error: {0}")]
    Storage(String),
}

/// A single slot holding the serialized profile
pub trait ProgressStore {
    /// `Ok(None)` when nothing has been saved yet
    fn read(&self) -> Result<Option<String>, PersistError>;
    /// Replace the stored blob
    fn write(&mut self, data: &str) -> Result<(), PersistError>;
    fn remove(&mut self) -> Result<(), PersistError>;
}

/// In-memory slot (tests, headless runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-filled slot
    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

impl ProgressStore for MemoryStore {
    fn read(&self) -> Result<Option<String>, PersistError> {
        Ok(self.data.clone())
    }

    fn write(&mut self, data: &str) -> Result<(), PersistError> {
        self.data = Some(data.to_string());
        Ok(())
    }

    fn remove(&mut self) -> Result<(), PersistError> {
        self.data = None;
        Ok(())
    }
}

/// One JSON file per profile key
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for FileStore {
    fn read(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &str) -> Result<(), PersistError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        // Readers never see a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn remove(&mut self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Browser LocalStorage slot
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }

    fn storage() -> Result<web_sys::Storage, PersistError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(PersistError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl ProgressStore for LocalStorageStore {
    fn read(&self) -> Result<Option<String>, PersistError> {
        Self::storage()?
            .get_item(&self.key)
            .map_err(|e| PersistError::Storage(format!("{e:?}")))
    }

    fn write(&mut self, data: &str) -> Result<(), PersistError> {
        Self::storage()?
            .set_item(&self.key, data)
            .map_err(|e| PersistError::Storage(format!("{e:?}")))
    }

    fn remove(&mut self) -> Result<(), PersistError> {
        Self::storage()?
            .remove_item(&self.key)
            .map_err(|e| PersistError::Storage(format!("{e:?}")))
    }
}
