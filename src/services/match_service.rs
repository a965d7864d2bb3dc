use tracing::info;

use crate::{
    dto::scoreboard::{
        FinishRequest, FinishResponse, MatchView, PointResponse, SetSummary, SettingsUpdate,
        UndoResponse,
    },
    error::ServiceError,
    services::{persistence, sse_events},
    state::{
        MatchEngine, SharedState,
        engine::{FinishMode, MatchError, PointOutcome},
        model::{Member, Side},
    },
};

/// Current scoreboard view.
pub async fn view(state: &SharedState) -> MatchView {
    let engine = state.engine().read().await;
    MatchView::from_engine(&engine, state.save_status())
}

/// Run one engine mutation to completion, then save and broadcast the result.
///
/// The engine lock is held while the operation runs and the document is
/// encoded; the save gate is taken before the lock is released so documents
/// reach storage in mutation order. A rejected operation changes nothing and
/// is neither saved nor broadcast.
pub async fn mutate<T, F>(state: &SharedState, op: F) -> Result<(T, MatchView), ServiceError>
where
    F: FnOnce(&mut MatchEngine) -> Result<T, MatchError>,
{
    let mut engine = state.engine().write().await;
    let value = op(&mut *engine)?;
    let mut view = MatchView::from_engine(&engine, state.save_status());
    let encoded = persistence::encode(state, &engine);

    let gate = state.save_gate().lock().await;
    drop(engine);
    view.save_status = persistence::persist(state, encoded).await;
    drop(gate);

    sse_events::broadcast_match_updated(state, &view);
    Ok((value, view))
}

/// Award a rally to `side`.
pub async fn add_point(state: &SharedState, side: Side) -> Result<PointResponse, ServiceError> {
    let (outcome, view) = mutate(state, |engine| Ok(engine.add_point(side))).await?;
    let finished_set = match outcome {
        PointOutcome::Continued => None,
        PointOutcome::SetFinished(record) => {
            info!(
                set_no = record.set_no,
                score_a = record.score_a,
                score_b = record.score_b,
                "set finished automatically"
            );
            Some(SetSummary::new(view.history.len().checked_sub(1), &record))
        }
    };
    Ok(PointResponse { finished_set, view })
}

/// Take back the last point.
pub async fn undo(state: &SharedState) -> Result<UndoResponse, ServiceError> {
    let (outcome, view) = mutate(state, |engine| Ok(engine.undo_last_point())).await?;
    Ok(UndoResponse::new(outcome, view))
}

/// Close the current set explicitly.
pub async fn finish_set(
    state: &SharedState,
    request: FinishRequest,
) -> Result<FinishResponse, ServiceError> {
    let mode = request.mode();
    let ((index, record), view) = mutate(state, |engine| {
        let index = match mode {
            FinishMode::Advance => Some(engine.state().history.len()),
            FinishMode::Reset => None,
        };
        Ok((index, engine.finish_set(mode)))
    })
    .await?;
    info!(set_no = record.set_no, mode = ?mode, "set finished on request");
    Ok(FinishResponse {
        finished_set: SetSummary::new(index, &record),
        view,
    })
}

/// Choose who serves first in the current set.
pub async fn set_initial_serve(
    state: &SharedState,
    side: Side,
    member: Member,
) -> Result<MatchView, ServiceError> {
    let ((), view) = mutate(state, |engine| engine.set_initial_serve(side, member)).await?;
    Ok(view)
}

/// Choose the side serving first; its first member serves.
pub async fn set_serve_side(state: &SharedState, side: Side) -> Result<MatchView, ServiceError> {
    let ((), view) = mutate(state, |engine| engine.set_serve_side(side)).await?;
    Ok(view)
}

/// Start the whole match over.
pub async fn reset(state: &SharedState) -> Result<MatchView, ServiceError> {
    let ((), view) = mutate(state, |engine| {
        engine.reset_all();
        Ok(())
    })
    .await?;
    info!("match reset");
    Ok(view)
}

/// Change scoring rules.
pub async fn update_settings(
    state: &SharedState,
    update: SettingsUpdate,
) -> Result<MatchView, ServiceError> {
    let ((), view) = mutate(state, |engine| {
        engine.update_settings(update.target_points, update.allow_deuce);
        Ok(())
    })
    .await?;
    Ok(view)
}

/// Summaries of every finished set.
pub async fn history(state: &SharedState) -> Vec<SetSummary> {
    view(state).await.history
}

/// Forget every finished set.
pub async fn clear_history(state: &SharedState) -> Result<MatchView, ServiceError> {
    let ((), view) = mutate(state, |engine| {
        engine.clear_history();
        Ok(())
    })
    .await?;
    Ok(view)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::{
            document::DocumentExtras,
            slot_store::MemorySlotStore,
        },
        dto::scoreboard::UndoKind,
        state::{AppState, SaveStatus, engine::ResetPolicy, model::Settings},
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
    async fn every_mutation_is_saved() {
        let store = MemorySlotStore::new();
        let state = shared(store.clone());

        let response = add_point(&state, Side::B).await.unwrap();
        assert!(response.finished_set.is_none());
        assert_eq!(response.view.sides.b.score, 1);
        assert_eq!(response.view.save_status, SaveStatus::Saved);

        let saved = store.document().await.unwrap();
        assert_eq!(saved["scores"]["B"], serde_json::json!(1));
        assert_eq!(saved["rallies"][0]["server"], serde_json::json!("B2"));
    }

    #[tokio::test]
    async fn storage_outage_does_not_block_scoring() {
        let store = MemorySlotStore::new();
        let state = shared(store.clone());
        store.set_online(false);

        let response = add_point(&state, Side::A).await.unwrap();
        assert_eq!(response.view.sides.a.score, 1);
        assert_eq!(response.view.save_status, SaveStatus::Failed);
        assert!(store.document().await.is_none());
    }

    #[tokio::test]
    async fn rejected_serve_change_is_not_saved() {
        let store = MemorySlotStore::new();
        let state = shared(store.clone());
        add_point(&state, Side::A).await.unwrap();
        store.set_online(false);

        let err = set_serve_side(&state, Side::B).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(state.save_status(), SaveStatus::Saved);
        assert_eq!(store.document().await.unwrap()["scores"]["A"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn winning_point_reports_finished_set_and_undo_reopens() {
        let state = shared(MemorySlotStore::new());
        update_settings(
            &state,
            SettingsUpdate {
                target_points: Some(2),
                allow_deuce: Some(false),
            },
        )
        .await
        .unwrap();

        add_point(&state, Side::A).await.unwrap();
        let response = add_point(&state, Side::A).await.unwrap();
        let finished = response.finished_set.unwrap();
        assert_eq!((finished.index, finished.score_a), (Some(0), 2));
        assert_eq!(response.view.set_no, 2);

        let undo = undo(&state).await.unwrap();
        assert!(matches!(undo.outcome, UndoKind::SetReopened));
        assert_eq!(undo.reopened_set, Some(1));
        assert_eq!(undo.view.sides.a.score, 1);
        assert!(history(&state).await.is_empty());
    }

    #[tokio::test]
    async fn explicit_finish_archives_then_advances() {
        let state = shared(MemorySlotStore::new());
        add_point(&state, Side::B).await.unwrap();

        let response = finish_set(&state, FinishRequest { auto: true }).await.unwrap();
        assert_eq!(response.finished_set.index, Some(0));
        assert_eq!(response.finished_set.winner, Side::B);
        assert_eq!(response.view.set_no, 2);

        let cleared = clear_history(&state).await.unwrap();
        assert!(cleared.history.is_empty());
        assert_eq!(cleared.set_no, 1);
    }

    #[tokio::test]
    async fn finish_with_reset_reports_no_history_index() {
        let state = shared(MemorySlotStore::new());
        add_point(&state, Side::A).await.unwrap();
        finish_set(&state, FinishRequest { auto: true }).await.unwrap();
        add_point(&state, Side::B).await.unwrap();

        let response = finish_set(&state, FinishRequest { auto: false }).await.unwrap();
        assert_eq!(response.finished_set.index, None);
        assert_eq!(response.finished_set.set_no, 2);
        assert!(response.view.history.is_empty());

        let body = serde_json::to_value(&response.finished_set).unwrap();
        assert!(body.get("index").is_none());
    }
}
