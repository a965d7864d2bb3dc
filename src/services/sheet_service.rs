use crate::{
    dto::sheet::{SheetHeader, SheetQuery, SheetResponse},
    error::ServiceError,
    state::{
        SharedState,
        model::{NamesByKey, Side},
        score_sheet::{MIN_PAGE_COLUMNS, ScoreSheet},
    },
};

fn page_columns(state: &SharedState, query: &SheetQuery) -> usize {
    query
        .columns
        .unwrap_or_else(|| state.sheet_page_columns())
        .max(MIN_PAGE_COLUMNS)
}

/// Score sheet of the set being played.
pub async fn live_sheet(state: &SharedState, query: SheetQuery) -> SheetResponse {
    let engine = state.engine().read().await;
    let match_state = engine.state();
    let sheet = ScoreSheet::project(
        &match_state.rallies,
        match_state.initial_serve.side,
        &NamesByKey::from_players(&match_state.players),
    );
    let header = SheetHeader {
        set_no: match_state.scores.set_no,
        in_progress: true,
        score_a: match_state.scores.a,
        score_b: match_state.scores.b,
        names_a: engine.names_top_down(Side::A),
        names_b: engine.names_top_down(Side::B),
        finished_sets: match_state.history.len(),
    };
    SheetResponse::new(header, &sheet, page_columns(state, &query))
}

/// Score sheet of the finished set at `index`.
///
/// Sets archived without per-player names fall back to the current roster.
pub async fn history_sheet(
    state: &SharedState,
    index: usize,
    query: SheetQuery,
) -> Result<SheetResponse, ServiceError> {
    let engine = state.engine().read().await;
    let record = engine.set_record(index)?;
    let names = record
        .names_by_key
        .clone()
        .unwrap_or_else(|| NamesByKey::from_players(&engine.state().players));
    let sheet = ScoreSheet::project(&record.rallies, record.first_server_side(), &names);
    let header = SheetHeader {
        set_no: record.set_no,
        in_progress: false,
        score_a: record.score_a,
        score_b: record.score_b,
        names_a: record.names.a.clone(),
        names_b: record.names.b.clone(),
        finished_sets: engine.state().history.len(),
    };
    Ok(SheetResponse::new(header, &sheet, page_columns(state, &query)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::{document::DocumentExtras, slot_store::MemorySlotStore},
        services::match_service,
        state::{AppState, MatchEngine, engine::ResetPolicy, model::Settings},
    };

    fn shared() -> SharedState {
        AppState::new(
            MatchEngine::fresh(Settings::default(), ResetPolicy::KeepRoster),
            Arc::new(MemorySlotStore::new()),
            DocumentExtras::default(),
            4,
        )
    }

    #[tokio::test]
    async fn live_sheet_tracks_rallies() {
        let state = shared();
        for side in [Side::A, Side::A, Side::B, Side::B, Side::A] {
            match_service::add_point(&state, side).await.unwrap();
        }

        let sheet = live_sheet(&state, SheetQuery::default()).await;
        assert!(sheet.in_progress);
        assert_eq!((sheet.score_a, sheet.score_b), (3, 2));
        assert_eq!(sheet.columns, 6);
        assert_eq!(sheet.lanes.len(), 4);
        assert_eq!(sheet.pages.len(), 2);
        assert_eq!(sheet.pages[0].start, 0);
        assert!(!sheet.serve_changes.is_empty());
    }

    #[tokio::test]
    async fn history_sheet_uses_archived_names() {
        let state = shared();
        match_service::update_settings(
            &state,
            crate::dto::scoreboard::SettingsUpdate {
                target_points: Some(2),
                allow_deuce: Some(false),
            },
        )
        .await
        .unwrap();
        match_service::add_point(&state, Side::B).await.unwrap();
        match_service::add_point(&state, Side::B).await.unwrap();

        let sheet = history_sheet(&state, 0, SheetQuery { columns: Some(1) })
            .await
            .unwrap();
        assert!(!sheet.in_progress);
        assert_eq!((sheet.score_a, sheet.score_b), (0, 2));
        assert_eq!(sheet.finished_sets, 1);
        assert_eq!(sheet.pages.len(), 1);
        assert!(sheet.lanes.iter().any(|lane| lane.label == "Player B2"));

        assert!(matches!(
            history_sheet(&state, 3, SheetQuery::default()).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
