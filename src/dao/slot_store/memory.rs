use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::dao::{
    slot_store::MatchStore,
    storage::{StorageError, StorageResult},
};

/// Raised while the in-memory slot is switched offline.
#[derive(Debug, Error)]
#[error("in-memory slot is offline")]
pub struct SlotOffline;

/// Keeps the document in process memory. Nothing survives a restart.
#[derive(Debug, Clone)]
pub struct MemorySlotStore {
    slot: Arc<Mutex<Option<Value>>>,
    online: Arc<AtomicBool>,
}

impl Default for MemorySlotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySlotStore {
    /// Empty slot.
    pub fn new() -> Self {
        Self::with_document(None)
    }

    /// Slot pre-filled with a document.
    pub fn with_document(document: Option<Value>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(document)),
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate the backend going away (or coming back).
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Copy of the stored document.
    pub async fn document(&self) -> Option<Value> {
        self.slot.lock().await.clone()
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::unavailable("memory slot store", SlotOffline))
        }
    }
}

impl MatchStore for MemorySlotStore {
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store.slot.lock().await.clone())
        })
    }

    fn save(&self, document: Value) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            *store.slot.lock().await = Some(document);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online() })
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn offline_slot_rejects_everything() {
        let store = MemorySlotStore::new();
        store.save(json!({ "a": 1 })).await.unwrap();

        store.set_online(false);
        assert!(store.load().await.is_err());
        assert!(store.save(json!({})).await.is_err());
        assert!(store.health_check().await.is_err());
        assert_eq!(store.document().await, Some(json!({ "a": 1 })));

        store.set_online(true);
        assert_eq!(store.load().await.unwrap(), Some(json!({ "a": 1 })));
    }
}
