use tracing::info;

use crate::{
    dto::players::PlayerListResponse,
    error::ServiceError,
    services::{match_service, sse_events},
    state::{MatchEngine, SharedState, engine::MatchError, model::Slot},
};

/// Registered players and slot assignments.
pub async fn list(state: &SharedState) -> PlayerListResponse {
    let engine = state.engine().read().await;
    PlayerListResponse::from_engine(&engine)
}

async fn mutate_roster<F>(state: &SharedState, op: F) -> Result<PlayerListResponse, ServiceError>
where
    F: FnOnce(&mut MatchEngine) -> Result<(), MatchError>,
{
    let (players, _view) = match_service::mutate(state, |engine| {
        op(engine)?;
        Ok(PlayerListResponse::from_engine(engine))
    })
    .await?;
    sse_events::broadcast_players_updated(state, &players);
    Ok(players)
}

/// Register a new name.
pub async fn add(state: &SharedState, name: &str) -> Result<PlayerListResponse, ServiceError> {
    let players = mutate_roster(state, |engine| {
        if engine.add_player_to_db(name) {
            Ok(())
        } else {
            Err(MatchError::DuplicatePlayer(name.trim().to_string()))
        }
    })
    .await?;
    info!(name = name.trim(), "player registered");
    Ok(players)
}

/// Rename a registered player everywhere the name appears.
pub async fn rename(
    state: &SharedState,
    old: &str,
    new: &str,
) -> Result<PlayerListResponse, ServiceError> {
    mutate_roster(state, |engine| {
        if !engine.state().player_db.contains(old) {
            return Err(MatchError::UnknownPlayer(old.to_string()));
        }
        engine.edit_player_name(old, new)
    })
    .await
}

/// Unregister a player and blank the slots holding the name.
pub async fn delete(state: &SharedState, name: &str) -> Result<PlayerListResponse, ServiceError> {
    mutate_roster(state, |engine| {
        if engine.delete_player(name) {
            Ok(())
        } else {
            Err(MatchError::UnknownPlayer(name.to_string()))
        }
    })
    .await
}

/// Seat a player in a slot, registering the name if needed.
pub async fn assign(
    state: &SharedState,
    name: &str,
    slot: Slot,
) -> Result<PlayerListResponse, ServiceError> {
    mutate_roster(state, |engine| engine.assign_player_to_slot(name, slot)).await
}

/// Exchange the names of two slots.
pub async fn swap(
    state: &SharedState,
    source: Slot,
    target: Slot,
) -> Result<PlayerListResponse, ServiceError> {
    mutate_roster(state, |engine| {
        engine.swap_slots(source, target);
        Ok(())
    })
    .await
}

/// Forget every registered name and blank all slots.
pub async fn reset_list(state: &SharedState) -> Result<PlayerListResponse, ServiceError> {
    let players = mutate_roster(state, |engine| {
        engine.reset_player_list();
        Ok(())
    })
    .await?;
    info!("player list reset");
    Ok(players)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::{document::DocumentExtras, slot_store::MemorySlotStore},
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

    fn slot(side: Side, row: usize) -> Slot {
        Slot { side, row }
    }

    #[tokio::test]
    async fn roster_changes_are_saved() {
        let store = MemorySlotStore::new();
        let state = shared(store.clone());

        add(&state, " Lee ").await.unwrap();
        let players = assign(&state, "Kim", slot(Side::A, 0)).await.unwrap();
        assert_eq!(players.players, vec!["Lee", "Kim"]);
        assert_eq!(players.slots[0].name, "Kim");

        let saved = store.document().await.unwrap();
        assert_eq!(saved["playerDB"], serde_json::json!([{ "name": "Lee" }, { "name": "Kim" }]));
    }

    #[tokio::test]
    async fn duplicates_and_unknown_names_are_rejected() {
        let state = shared(MemorySlotStore::new());
        add(&state, "Lee").await.unwrap();
        add(&state, "Kim").await.unwrap();

        assert!(matches!(
            add(&state, "Lee").await,
            Err(ServiceError::InvalidState(_))
        ));
        assert!(matches!(
            rename(&state, "Lee", "Kim").await,
            Err(ServiceError::InvalidState(_))
        ));
        assert!(matches!(
            rename(&state, "Nobody", "Park").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            delete(&state, "Nobody").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rename_and_delete_follow_the_slots() {
        let state = shared(MemorySlotStore::new());
        assign(&state, "Lee", slot(Side::B, 1)).await.unwrap();

        let players = rename(&state, "Lee", "Park").await.unwrap();
        assert_eq!(players.players, vec!["Park"]);
        assert_eq!(players.slots[3].name, "Park");

        let players = delete(&state, "Park").await.unwrap();
        assert!(players.players.is_empty());
        assert_eq!(players.slots[3].name, "");
    }

    #[tokio::test]
    async fn swap_and_reset_list() {
        let state = shared(MemorySlotStore::new());
        let players = swap(&state, slot(Side::A, 0), slot(Side::B, 0)).await.unwrap();
        assert_eq!(players.slots[0].name, "Player B1");
        assert_eq!(players.slots[2].name, "Player A2");

        let players = reset_list(&state).await.unwrap();
        assert!(players.players.is_empty());
        assert!(players.slots.iter().all(|entry| entry.name.is_empty()));
    }
}
