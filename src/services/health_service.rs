use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the storage backend answers, alongside the latest save outcome.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let store = state.store();
    let storage = store.describe();
    let save_status = state.save_status();

    match store.health_check().await {
        Ok(()) => HealthResponse::ok(storage, save_status),
        Err(err) => {
            warn!(error = %err, storage = %storage, "storage health check failed");
            HealthResponse::degraded(storage, save_status)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::{document::DocumentExtras, slot_store::MemorySlotStore},
        state::{AppState, MatchEngine, SaveStatus, engine::ResetPolicy, model::Settings},
    };

    #[tokio::test]
    async fn offline_store_reports_degraded() {
        let store = MemorySlotStore::new();
        let state = AppState::new(
            MatchEngine::fresh(Settings::default(), ResetPolicy::KeepRoster),
            Arc::new(store.clone()),
            DocumentExtras::default(),
            10,
        );

        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.save_status, SaveStatus::Idle);

        store.set_online(false);
        assert_eq!(health_status(&state).await.status, "degraded");
    }
}
