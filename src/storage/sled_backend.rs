use std::path::{Path, PathBuf};
use tracing::info;

use super::StorageBackend;
use crate::error::{DeskError, Result};

/// Durable backend over an embedded sled database.
///
/// Every write is flushed before returning, so a completed `save` survives a
/// crash. sled holds an exclusive lock on the directory; a second process
/// opening the same data directory fails instead of racing.
pub struct SledBackend {
    db: sled::Db,
    path: PathBuf,
}

impl SledBackend {
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db = sled::open(data_dir)
            .map_err(|e| DeskError::Storage(format!("Failed to open store at {}: {e}", data_dir.display())))?;
        info!(path = %data_dir.display(), "opened local store");
        Ok(Self {
            db,
            path: data_dir.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for SledBackend {
    fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key.as_bytes())?.map(|bytes| bytes.to_vec()))
    }

    fn set_item(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db.insert(key.as_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.db.remove(key.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }
}
