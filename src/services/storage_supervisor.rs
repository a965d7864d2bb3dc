use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::storage::StorageResult,
    services::persistence,
    state::{SaveStatus, SharedState},
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Watch the storage backend and rewrite the match once it is reachable again
/// after a failed save. Runs for the lifetime of the process.
pub async fn run(state: SharedState) {
    let mut delay = INITIAL_DELAY;
    let mut reachable = true;

    loop {
        match check_once(&state).await {
            Ok(()) => {
                if !reachable {
                    info!(storage = %state.store().describe(), "storage reachable again");
                    reachable = true;
                }
                delay = INITIAL_DELAY;
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                if reachable {
                    warn!(error = %err, "storage health check failed; match kept in memory");
                    reachable = false;
                }
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// One supervision step: probe the backend, then retry the pending save if the
/// last one failed. A failing retry is logged by the save itself.
pub async fn check_once(state: &SharedState) -> StorageResult<()> {
    state.store().health_check().await?;

    if state.save_status() == SaveStatus::Failed
        && persistence::save_current(state).await == SaveStatus::Saved
    {
        info!("pending match save written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::{document::DocumentExtras, slot_store::MemorySlotStore},
        services::match_service,
        state::{
            AppState, MatchEngine,
            engine::ResetPolicy,
            model::{Settings, Side},
        },
    };

    #[tokio::test]
    async fn failed_save_is_retried_once_storage_returns() {
        let store = MemorySlotStore::new();
        let state = AppState::new(
            MatchEngine::fresh(Settings::default(), ResetPolicy::KeepRoster),
            Arc::new(store.clone()),
            DocumentExtras::default(),
            10,
        );

        store.set_online(false);
        match_service::add_point(&state, Side::A).await.unwrap();
        assert_eq!(state.save_status(), SaveStatus::Failed);
        assert!(check_once(&state).await.is_err());

        store.set_online(true);
        check_once(&state).await.unwrap();
        assert_eq!(state.save_status(), SaveStatus::Saved);
        let saved = store.document().await.unwrap();
        assert_eq!(saved["scores"]["A"], serde_json::json!(1));
    }
}
