use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        document::{self, DocumentExtras},
        slot_store::MatchStore,
        storage::StorageError,
    },
    state::{MatchEngine, SaveStatus, SharedState, engine::MatchState},
};

/// Read the stored match, if a usable one exists.
///
/// Unreachable storage and malformed documents are logged and treated as
/// "nothing stored", so start-up never fails on them.
pub async fn restore(store: &dyn MatchStore) -> Option<(MatchState, DocumentExtras)> {
    match store.load().await {
        Ok(Some(value)) => {
            let restored = document::decode(value);
            if let Some((state, _)) = &restored {
                info!(
                    storage = %store.describe(),
                    set_no = state.scores.set_no,
                    score_a = state.scores.a,
                    score_b = state.scores.b,
                    finished_sets = state.history.len(),
                    "restored match from storage"
                );
            }
            restored
        }
        Ok(None) => {
            info!(storage = %store.describe(), "no stored match; starting fresh");
            None
        }
        Err(err) => {
            warn!(
                storage = %store.describe(),
                error = %err,
                "failed to load stored match; starting fresh"
            );
            None
        }
    }
}

/// Encode the engine's state for storage.
pub fn encode(state: &SharedState, engine: &MatchEngine) -> serde_json::Result<Value> {
    document::encode(engine.state(), state.extras())
}

/// Write an encoded document and record the outcome. Failures never propagate:
/// the mutation already stands in memory.
pub async fn persist(state: &SharedState, encoded: serde_json::Result<Value>) -> SaveStatus {
    let result = match encoded {
        Ok(document) => state.store().save(document).await,
        Err(err) => Err(StorageError::Encode(err)),
    };

    let status = match result {
        Ok(()) => {
            debug!("match saved");
            SaveStatus::Saved
        }
        Err(err) => {
            warn!(error = %err, "failed to save match; keeping it in memory");
            SaveStatus::Failed
        }
    };
    state.update_save_status(status);
    status
}

/// Re-encode the current match and write it, serialized with other saves.
///
/// Locks are taken in the same order as mutations take them: engine first,
/// then the save gate.
pub async fn save_current(state: &SharedState) -> SaveStatus {
    let engine = state.engine().read().await;
    let encoded = encode(state, &engine);
    let gate = state.save_gate().lock().await;
    drop(engine);
    let status = persist(state, encoded).await;
    drop(gate);
    status
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use serde_json::json;

    use super::*;
    use crate::{
        dao::slot_store::MemorySlotStore,
        services::match_service,
        state::{
            AppState,
            engine::ResetPolicy,
            model::{Settings, Side},
        },
    };

    fn shared(store: MemorySlotStore) -> SharedState {
        AppState::new(
            MatchEngine::fresh(Settings::default(), ResetPolicy::KeepRoster),
            Arc::new(store),
            DocumentExtras::default(),
            10,
        )
    }

    #[tokio::test]
    async fn restore_skips_garbage_and_missing_documents() {
        assert!(restore(&MemorySlotStore::new()).await.is_none());
        let garbage = MemorySlotStore::with_document(Some(json!({ "scores": "3-1" })));
        assert!(restore(&garbage).await.is_none());

        let offline = MemorySlotStore::new();
        offline.set_online(false);
        assert!(restore(&offline).await.is_none());
    }

    #[tokio::test]
    async fn save_failure_is_reported_not_raised() {
        let store = MemorySlotStore::new();
        let state = shared(store.clone());
        let mut status = state.save_status_watcher();

        store.set_online(false);
        assert_eq!(save_current(&state).await, SaveStatus::Failed);
        assert_eq!(state.save_status(), SaveStatus::Failed);
        assert!(status.has_changed().unwrap());
        status.mark_unchanged();

        store.set_online(true);
        assert_eq!(save_current(&state).await, SaveStatus::Saved);
        assert!(store.document().await.is_some());

        assert_eq!(save_current(&state).await, SaveStatus::Saved);
        assert_eq!(*status.borrow_and_update(), SaveStatus::Saved);
        assert!(!status.has_changed().unwrap());
    }

    #[tokio::test]
    async fn resave_queued_behind_a_point_does_not_deadlock() {
        let store = MemorySlotStore::new();
        let state = shared(store.clone());
        let reader = state.engine().read().await;

        let point = tokio::spawn({
            let state = state.clone();
            async move { match_service::add_point(&state, Side::A).await }
        });
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        let resave = tokio::spawn({
            let state = state.clone();
            async move { save_current(&state).await }
        });
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        drop(reader);

        let (point, resave) = tokio::time::timeout(Duration::from_secs(3), async {
            (point.await.unwrap(), resave.await.unwrap())
        })
        .await
        .expect("point and re-save should both complete");

        assert_eq!(point.unwrap().view.sides.a.score, 1);
        assert_eq!(resave, SaveStatus::Saved);
        assert_eq!(store.document().await.unwrap()["scores"]["A"], json!(1));
    }
}
