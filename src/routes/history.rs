use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::{
        scoreboard::{MatchView, SetSummary},
        sheet::{SheetQuery, SheetResponse},
    },
    error::AppError,
    services::{match_service, sheet_service},
    state::SharedState,
};

/// Finished-set endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/history", get(list_history).delete(clear_history))
        .route("/history/{index}/sheet", get(history_sheet))
}

#[utoipa::path(
    get,
    path = "/history",
    tag = "history",
    responses((status = 200, description = "Finished sets, oldest first", body = [SetSummary]))
)]
/// List finished sets.
pub async fn list_history(State(state): State<SharedState>) -> Json<Vec<SetSummary>> {
    Json(match_service::history(&state).await)
}

#[utoipa::path(
    delete,
    path = "/history",
    tag = "history",
    responses((status = 200, description = "History cleared", body = MatchView))
)]
/// Forget all finished sets.
pub async fn clear_history(State(state): State<SharedState>) -> Result<Json<MatchView>, AppError> {
    Ok(Json(match_service::clear_history(&state).await?))
}

#[utoipa::path(
    get,
    path = "/history/{index}/sheet",
    tag = "history",
    params(
        ("index" = usize, Path, description = "Position of the set in the history list"),
        SheetQuery
    ),
    responses(
        (status = 200, description = "Score sheet of a finished set", body = SheetResponse),
        (status = 404, description = "No finished set at that index")
    )
)]
/// Score sheet of a finished set.
pub async fn history_sheet(
    State(state): State<SharedState>,
    Path(index): Path<usize>,
    Query(query): Query<SheetQuery>,
) -> Result<Json<SheetResponse>, AppError> {
    Ok(Json(
        sheet_service::history_sheet(&state, index, query).await?,
    ))
}
