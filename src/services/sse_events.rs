use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    dto::{
        players::PlayerListResponse,
        scoreboard::MatchView,
        sse::{SaveStatusEvent, ServerEvent},
    },
    state::{SaveStatus, SharedState},
};

const EVENT_MATCH_UPDATED: &str = "match.updated";
const EVENT_PLAYERS_UPDATED: &str = "players.updated";
const EVENT_SAVE_STATUS: &str = "save.status";

/// Broadcast the scoreboard after a mutation.
pub fn broadcast_match_updated(state: &SharedState, view: &MatchView) {
    send_public_event(state, EVENT_MATCH_UPDATED, view);
}

/// Broadcast the roster after a player operation.
pub fn broadcast_players_updated(state: &SharedState, players: &PlayerListResponse) {
    send_public_event(state, EVENT_PLAYERS_UPDATED, players);
}

/// Broadcast a change of the save status.
pub fn broadcast_save_status(state: &SharedState, status: SaveStatus) {
    send_public_event(state, EVENT_SAVE_STATUS, &SaveStatusEvent { status });
}

/// Relay every save status change onto the public stream until the state is dropped.
pub fn spawn_status_forwarder(state: SharedState) -> JoinHandle<()> {
    let mut receiver = state.save_status_watcher();
    let weak = Arc::downgrade(&state);
    drop(state);

    tokio::spawn(async move {
        while receiver.changed().await.is_ok() {
            let status = *receiver.borrow_and_update();
            let Some(state) = weak.upgrade() else {
                break;
            };
            debug!(?status, "save status changed");
            broadcast_save_status(&state, status);
        }
    })
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{document::DocumentExtras, slot_store::MemorySlotStore},
        state::{AppState, MatchEngine, engine::ResetPolicy, model::Settings},
    };

    fn shared() -> SharedState {
        AppState::new(
            MatchEngine::fresh(Settings::default(), ResetPolicy::KeepRoster),
            Arc::new(MemorySlotStore::new()),
            DocumentExtras::default(),
            10,
        )
    }

    #[tokio::test]
    async fn save_status_changes_reach_subscribers() {
        let state = shared();
        let mut receiver = state.public_sse().subscribe();
        let forwarder = spawn_status_forwarder(state.clone());

        state.update_save_status(SaveStatus::Failed);
        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_SAVE_STATUS));
        assert_eq!(event.data, r#"{"status":"failed"}"#);

        forwarder.abort();
    }

    #[tokio::test]
    async fn match_updates_are_named() {
        let state = shared();
        let mut receiver = state.public_sse().subscribe();
        let view = {
            let engine = state.engine().read().await;
            MatchView::from_engine(&engine, SaveStatus::Idle)
        };

        broadcast_match_updated(&state, &view);
        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_MATCH_UPDATED));
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["setNo"], serde_json::json!(1));
    }
}
