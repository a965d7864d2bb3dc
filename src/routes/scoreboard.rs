use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post, put},
};

use crate::{
    dto::{
        scoreboard::{
            FinishRequest, FinishResponse, MatchView, PointRequest, PointResponse, ServeRequest,
            ServeSideRequest, SettingsUpdate, UndoResponse,
        },
        sheet::{SheetQuery, SheetResponse},
    },
    error::AppError,
    services::{match_service, sheet_service},
    state::SharedState,
};

/// Live scoreboard endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/match", get(get_match))
        .route("/match/points", post(add_point))
        .route("/match/undo", post(undo_point))
        .route("/match/finish", post(finish_set))
        .route("/match/serve", put(set_initial_serve))
        .route("/match/serve-side", put(set_serve_side))
        .route("/match/reset", post(reset_match))
        .route("/match/settings", put(update_settings))
        .route("/match/sheet", get(live_sheet))
}

#[utoipa::path(
    get,
    path = "/match",
    tag = "match",
    responses((status = 200, description = "Current scoreboard", body = MatchView))
)]
/// Return the scoreboard as it stands.
pub async fn get_match(State(state): State<SharedState>) -> Json<MatchView> {
    Json(match_service::view(&state).await)
}

#[utoipa::path(
    post,
    path = "/match/points",
    tag = "match",
    request_body = PointRequest,
    responses((status = 200, description = "Point recorded", body = PointResponse))
)]
/// Award a rally to one side.
pub async fn add_point(
    State(state): State<SharedState>,
    Json(payload): Json<PointRequest>,
) -> Result<Json<PointResponse>, AppError> {
    Ok(Json(match_service::add_point(&state, payload.side).await?))
}

#[utoipa::path(
    post,
    path = "/match/undo",
    tag = "match",
    responses((status = 200, description = "Last point taken back", body = UndoResponse))
)]
/// Take back the last point, reopening a set its winning point closed.
pub async fn undo_point(State(state): State<SharedState>) -> Result<Json<UndoResponse>, AppError> {
    Ok(Json(match_service::undo(&state).await?))
}

#[utoipa::path(
    post,
    path = "/match/finish",
    tag = "match",
    request_body = FinishRequest,
    responses((status = 200, description = "Set archived", body = FinishResponse))
)]
/// Archive the current set and start the next one or reset the match.
pub async fn finish_set(
    State(state): State<SharedState>,
    Json(payload): Json<FinishRequest>,
) -> Result<Json<FinishResponse>, AppError> {
    Ok(Json(match_service::finish_set(&state, payload).await?))
}

#[utoipa::path(
    put,
    path = "/match/serve",
    tag = "match",
    request_body = ServeRequest,
    responses(
        (status = 200, description = "First server chosen", body = MatchView),
        (status = 409, description = "Serve can no longer change")
    )
)]
/// Choose the player serving first in the current set.
pub async fn set_initial_serve(
    State(state): State<SharedState>,
    Json(payload): Json<ServeRequest>,
) -> Result<Json<MatchView>, AppError> {
    Ok(Json(
        match_service::set_initial_serve(&state, payload.side, payload.member).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/match/serve-side",
    tag = "match",
    request_body = ServeSideRequest,
    responses(
        (status = 200, description = "Serving side chosen", body = MatchView),
        (status = 409, description = "Serve can no longer change")
    )
)]
/// Choose the side serving first; its first member serves.
pub async fn set_serve_side(
    State(state): State<SharedState>,
    Json(payload): Json<ServeSideRequest>,
) -> Result<Json<MatchView>, AppError> {
    Ok(Json(match_service::set_serve_side(&state, payload.side).await?))
}

#[utoipa::path(
    post,
    path = "/match/reset",
    tag = "match",
    responses((status = 200, description = "Match reset", body = MatchView))
)]
/// Start the match over.
pub async fn reset_match(State(state): State<SharedState>) -> Result<Json<MatchView>, AppError> {
    Ok(Json(match_service::reset(&state).await?))
}

#[utoipa::path(
    put,
    path = "/match/settings",
    tag = "match",
    request_body = SettingsUpdate,
    responses((status = 200, description = "Settings updated", body = MatchView))
)]
/// Change target score or deuce.
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(payload): Json<SettingsUpdate>,
) -> Result<Json<MatchView>, AppError> {
    Ok(Json(match_service::update_settings(&state, payload).await?))
}

#[utoipa::path(
    get,
    path = "/match/sheet",
    tag = "match",
    params(SheetQuery),
    responses((status = 200, description = "Score sheet of the current set", body = SheetResponse))
)]
/// Score sheet of the set being played.
pub async fn live_sheet(
    State(state): State<SharedState>,
    Query(query): Query<SheetQuery>,
) -> Json<SheetResponse> {
    Json(sheet_service::live_sheet(&state, query).await)
}
