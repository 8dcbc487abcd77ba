//! Storage transport for the persisted ledger blob

use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ledgerbook_config::Config;

use crate::error::{CoreError, CoreResult};

/// Reads and writes one JSON blob under a fixed key
pub trait Storage {
    /// Read the stored blob, `None` if nothing has been saved yet
    fn load(&self) -> CoreResult<Option<String>>;
    /// Replace the stored blob
    fn save(&self, blob: &str) -> CoreResult<()>;
}

/// Owned storage handle held by the engine
pub type StorageRef = Box<dyn Storage>;

/// Blob kept in a file on disk
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the configured data directory and key
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.storage_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> CoreResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::Storage {
                message: format!("failed to read {}: {}", self.path.display(), e),
            }),
        }
    }

    fn save(&self, blob: &str) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // Write beside the target and rename so a failed write keeps the old blob
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, blob).map_err(|e| CoreError::Storage {
            message: format!("failed to write {}: {}", tmp.display(), e),
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| CoreError::Storage {
            message: format!("failed to replace {}: {}", self.path.display(), e),
        })?;
        log::debug!("Saved {} bytes to {}", blob.len(), self.path.display());
        Ok(())
    }
}

/// In-process blob, for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blob: RefCell<Option<String>>,
    fail_saves: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing blob
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RefCell::new(Some(blob.into())),
            fail_saves: Cell::new(false),
        }
    }

    /// Make subsequent saves fail
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    /// Last saved blob
    pub fn blob(&self) -> Option<String> {
        self.blob.borrow().clone()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> CoreResult<Option<String>> {
        Ok(self.blob.borrow().clone())
    }

    fn save(&self, blob: &str) -> CoreResult<()> {
        if self.fail_saves.get() {
            return Err(CoreError::Storage { message: "storage unavailable".to_string() });
        }
        *self.blob.borrow_mut() = Some(blob.to_string());
        Ok(())
    }
}

impl<S: Storage + ?Sized> Storage for std::rc::Rc<S> {
    fn load(&self) -> CoreResult<Option<String>> {
        (**self).load()
    }

    fn save(&self, blob: &str) -> CoreResult<()> {
        (**self).save(blob)
    }
}
