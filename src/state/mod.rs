//! Match domain and the shared application state wrapping it.

pub mod engine;
pub mod model;
pub mod rotation;
pub mod score_sheet;
pub mod snapshot;
mod sse;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock, watch};
use utoipa::ToSchema;

use crate::dao::{document::DocumentExtras, slot_store::MatchStore};

pub use self::engine::MatchEngine;
pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Capacity of the public SSE channel.
const PUBLIC_SSE_CAPACITY: usize = 32;

/// Outcome of the most recent attempt to persist the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    /// Nothing has been written since start-up.
    Idle,
    /// The last mutation was written.
    Saved,
    /// The last write failed; the match only lives in memory.
    Failed,
}

/// Central application state: the match engine and where it is persisted.
pub struct AppState {
    engine: RwLock<MatchEngine>,
    store: Arc<dyn MatchStore>,
    extras: DocumentExtras,
    sse: SseHub,
    save_status: watch::Sender<SaveStatus>,
    save_gate: Mutex<()>,
    sheet_page_columns: usize,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        engine: MatchEngine,
        store: Arc<dyn MatchStore>,
        extras: DocumentExtras,
        sheet_page_columns: usize,
    ) -> SharedState {
        let (save_status, _rx) = watch::channel(SaveStatus::Idle);
        Arc::new(Self {
            engine: RwLock::new(engine),
            store,
            extras,
            sse: SseHub::new(PUBLIC_SSE_CAPACITY),
            save_status,
            save_gate: Mutex::new(()),
            sheet_page_columns,
        })
    }

    /// The match engine. Mutations take the write lock for their whole run.
    pub fn engine(&self) -> &RwLock<MatchEngine> {
        &self.engine
    }

    /// Handle to the storage backend.
    pub fn store(&self) -> Arc<dyn MatchStore> {
        self.store.clone()
    }

    /// Document keys carried through every save.
    pub fn extras(&self) -> &DocumentExtras {
        &self.extras
    }

    /// Serializes writes so documents reach storage in mutation order.
    pub fn save_gate(&self) -> &Mutex<()> {
        &self.save_gate
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Default score-sheet page width.
    pub fn sheet_page_columns(&self) -> usize {
        self.sheet_page_columns
    }

    /// Current save status.
    pub fn save_status(&self) -> SaveStatus {
        *self.save_status.borrow()
    }

    /// Subscribe to save status changes.
    pub fn save_status_watcher(&self) -> watch::Receiver<SaveStatus> {
        self.save_status.subscribe()
    }

    /// Record the outcome of a save, notifying watchers only on change.
    pub fn update_save_status(&self, value: SaveStatus) {
        self.save_status.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}
