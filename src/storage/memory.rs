use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::StorageBackend;
use crate::error::Result;

/// Process-local backend, used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Number of keys currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set_item(&self, key: &str, value: &[u8]) -> Result<()> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
