use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::validate_player_name,
    state::{
        MatchEngine,
        model::{Side, Slot},
    },
};

/// Registered players and who currently sits in each scoreboard slot.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerListResponse {
    /// Registered names, in registration order.
    pub players: Vec<String>,
    /// Names per slot (`A0`, `A1`, `B0`, `B1`), top row first.
    pub slots: Vec<SlotAssignment>,
}

/// Name shown in one slot.
#[derive(Debug, Serialize, ToSchema)]
pub struct SlotAssignment {
    /// Slot label.
    pub slot: String,
    /// Name currently shown, possibly empty.
    pub name: String,
}

impl PlayerListResponse {
    /// Snapshot the roster from the engine.
    pub fn from_engine(engine: &MatchEngine) -> Self {
        let slots = Side::ALL
            .into_iter()
            .flat_map(|side| [0, 1].map(|row| Slot { side, row }))
            .map(|slot| SlotAssignment {
                slot: slot.to_string(),
                name: engine.slot_name(slot).to_string(),
            })
            .collect();

        Self {
            players: engine.state().player_db.iter().map(str::to_string).collect(),
            slots,
        }
    }
}

/// Payload carrying a single player name (register or rename).
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlayerNameRequest {
    /// Player name; surrounding whitespace is ignored.
    #[validate(custom(function = "validate_player_name"))]
    pub name: String,
}

/// Payload for `POST /players/assign`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AssignPlayerRequest {
    /// Player to seat.
    #[validate(custom(function = "validate_player_name"))]
    pub name: String,
    /// Target slot.
    #[schema(value_type = String, example = "A0")]
    pub slot: Slot,
}

/// Payload for `POST /players/swap`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwapSlotsRequest {
    /// First slot.
    #[schema(value_type = String, example = "A0")]
    pub source: Slot,
    /// Second slot.
    #[schema(value_type = String, example = "B1")]
    pub target: Slot,
}
