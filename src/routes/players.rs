use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::players::{AssignPlayerRequest, PlayerListResponse, PlayerNameRequest, SwapSlotsRequest},
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Roster and slot assignment endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players", get(list_players).post(add_player))
        .route("/players/reset", post(reset_players))
        .route("/players/{name}", put(rename_player).delete(delete_player))
        .route("/players/assign", post(assign_player))
        .route("/players/swap", post(swap_slots))
}

#[utoipa::path(
    get,
    path = "/players",
    tag = "players",
    responses((status = 200, description = "Roster and slots", body = PlayerListResponse))
)]
/// List registered players and slot assignments.
pub async fn list_players(State(state): State<SharedState>) -> Json<PlayerListResponse> {
    Json(player_service::list(&state).await)
}

#[utoipa::path(
    post,
    path = "/players",
    tag = "players",
    request_body = PlayerNameRequest,
    responses(
        (status = 200, description = "Player registered", body = PlayerListResponse),
        (status = 400, description = "Invalid name"),
        (status = 409, description = "Name already registered")
    )
)]
/// Register a player.
pub async fn add_player(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<PlayerNameRequest>>,
) -> Result<Json<PlayerListResponse>, AppError> {
    Ok(Json(player_service::add(&state, &payload.name).await?))
}

#[utoipa::path(
    put,
    path = "/players/{name}",
    tag = "players",
    params(("name" = String, Path, description = "Current name")),
    request_body = PlayerNameRequest,
    responses(
        (status = 200, description = "Player renamed", body = PlayerListResponse),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "New name already registered")
    )
)]
/// Rename a player everywhere.
pub async fn rename_player(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Valid(Json(payload)): Valid<Json<PlayerNameRequest>>,
) -> Result<Json<PlayerListResponse>, AppError> {
    Ok(Json(
        player_service::rename(&state, &name, &payload.name).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/players/{name}",
    tag = "players",
    params(("name" = String, Path, description = "Player to remove")),
    responses(
        (status = 200, description = "Player removed", body = PlayerListResponse),
        (status = 404, description = "Unknown player")
    )
)]
/// Unregister a player, blanking the slots holding the name.
pub async fn delete_player(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<PlayerListResponse>, AppError> {
    Ok(Json(player_service::delete(&state, &name).await?))
}

#[utoipa::path(
    post,
    path = "/players/reset",
    tag = "players",
    responses((status = 200, description = "Roster cleared", body = PlayerListResponse))
)]
/// Forget every player and blank all slots.
pub async fn reset_players(
    State(state): State<SharedState>,
) -> Result<Json<PlayerListResponse>, AppError> {
    Ok(Json(player_service::reset_list(&state).await?))
}

#[utoipa::path(
    post,
    path = "/players/assign",
    tag = "players",
    request_body = AssignPlayerRequest,
    responses(
        (status = 200, description = "Player seated", body = PlayerListResponse),
        (status = 400, description = "Invalid name or slot")
    )
)]
/// Seat a player in a scoreboard slot.
pub async fn assign_player(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AssignPlayerRequest>>,
) -> Result<Json<PlayerListResponse>, AppError> {
    Ok(Json(
        player_service::assign(&state, &payload.name, payload.slot).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/players/swap",
    tag = "players",
    request_body = SwapSlotsRequest,
    responses((status = 200, description = "Slots swapped", body = PlayerListResponse))
)]
/// Exchange the names shown in two slots.
pub async fn swap_slots(
    State(state): State<SharedState>,
    Json(payload): Json<SwapSlotsRequest>,
) -> Result<Json<PlayerListResponse>, AppError> {
    Ok(Json(
        player_service::swap(&state, payload.source, payload.target).await?,
    ))
}
