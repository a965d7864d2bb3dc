//! Backends holding the single match document.

pub mod file;
pub mod memory;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::dao::storage::StorageResult;

pub use file::FileSlotStore;
pub use memory::MemorySlotStore;

/// Abstraction over the place the match document is kept.
///
/// A store holds exactly one document under the key it was built with; every
/// save replaces it whole.
pub trait MatchStore: Send + Sync {
    /// Read the stored document, `None` when nothing (readable) is stored.
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<Value>>>;
    /// Replace the stored document.
    fn save(&self, document: Value) -> BoxFuture<'static, StorageResult<()>>;
    /// Check that the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}
