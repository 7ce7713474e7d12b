use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{KeyStore, KeyStoreError};

/// In-memory key store
///
/// Clones share the same slots, which makes it easy to hand one to a
/// manager and keep another to inspect or corrupt in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    slots: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn read(&self, slot: &str) -> Result<Option<String>, KeyStoreError> {
        Ok(self.slots.read().get(slot).cloned())
    }

    fn write(&self, slot: &str, value: &str) -> Result<(), KeyStoreError> {
        self.slots.write().insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), KeyStoreError> {
        self.slots.write().remove(slot);
        Ok(())
    }
}
