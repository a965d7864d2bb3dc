use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the badminton scoreboard.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::scoreboard::get_match,
        crate::routes::scoreboard::add_point,
        crate::routes::scoreboard::undo_point,
        crate::routes::scoreboard::finish_set,
        crate::routes::scoreboard::set_initial_serve,
        crate::routes::scoreboard::set_serve_side,
        crate::routes::scoreboard::reset_match,
        crate::routes::scoreboard::update_settings,
        crate::routes::scoreboard::live_sheet,
        crate::routes::history::list_history,
        crate::routes::history::clear_history,
        crate::routes::history::history_sheet,
        crate::routes::players::list_players,
        crate::routes::players::add_player,
        crate::routes::players::rename_player,
        crate::routes::players::delete_player,
        crate::routes::players::reset_players,
        crate::routes::players::assign_player,
        crate::routes::players::swap_slots,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::scoreboard::MatchView,
            crate::dto::scoreboard::SidesView,
            crate::dto::scoreboard::SideView,
            crate::dto::scoreboard::ServingView,
            crate::dto::scoreboard::SettingsView,
            crate::dto::scoreboard::SetSummary,
            crate::dto::scoreboard::PointRequest,
            crate::dto::scoreboard::PointResponse,
            crate::dto::scoreboard::UndoKind,
            crate::dto::scoreboard::UndoResponse,
            crate::dto::scoreboard::FinishRequest,
            crate::dto::scoreboard::FinishResponse,
            crate::dto::scoreboard::ServeRequest,
            crate::dto::scoreboard::ServeSideRequest,
            crate::dto::scoreboard::SettingsUpdate,
            crate::dto::sheet::SheetResponse,
            crate::dto::sheet::PageView,
            crate::dto::sheet::LaneView,
            crate::dto::players::PlayerListResponse,
            crate::dto::players::SlotAssignment,
            crate::dto::players::PlayerNameRequest,
            crate::dto::players::AssignPlayerRequest,
            crate::dto::players::SwapSlotsRequest,
            crate::dto::sse::SaveStatusEvent,
            crate::state::SaveStatus,
            crate::state::model::Side,
            crate::state::model::Member,
            crate::state::model::PlayerKey,
            crate::state::model::TeamNames,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "match", description = "Live scoring of the current set"),
        (name = "history", description = "Finished sets and their score sheets"),
        (name = "players", description = "Roster and scoreboard slot assignment"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/match",
            "/match/points",
            "/match/sheet",
            "/history/{index}/sheet",
            "/players/{name}",
            "/sse/public",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
