use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::format_millis,
    state::{
        MatchEngine, SaveStatus,
        engine::{FinishMode, UndoOutcome},
        model::{Member, PlayerKey, SetRecord, Side, TeamNames},
    },
};

/// Scoring rules as shown to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    /// Points needed to win a set.
    pub target_points: u32,
    /// Whether a two-point lead is required.
    pub allow_deuce: bool,
    /// Score at which a set ends regardless of the lead.
    pub cap: u32,
    /// Legacy mode in which sets never end automatically.
    pub cumulative: bool,
}

/// Everything the scoreboard draws for one side.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SideView {
    /// Points in the current set.
    pub score: u32,
    /// Names keyed by member.
    pub names: TeamNames,
    /// Names top to bottom.
    pub display: Vec<String>,
    /// Keys top to bottom.
    pub display_keys: Vec<PlayerKey>,
    /// Member in the right service court.
    pub right: Member,
    /// Member in the left service court.
    pub left: Member,
    /// Member who last took serve for this side.
    pub last_server: Member,
    /// Whether this side may be chosen to serve first right now.
    pub can_serve_first: bool,
}

/// Both sides of the scoreboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SidesView {
    /// Side A.
    #[serde(rename = "A")]
    pub a: SideView,
    /// Side B.
    #[serde(rename = "B")]
    pub b: SideView,
}

/// Player holding serve.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServingView {
    /// Serving side.
    pub side: Side,
    /// Serving member.
    pub member: Member,
    /// `A1`-style label.
    pub label: String,
}

/// Short description of a finished set.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetSummary {
    /// Position in the history list, usable with the sheet endpoint. Absent
    /// when the set is no longer kept in history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Set number inside the match.
    pub set_no: u32,
    /// Final score of side A.
    pub score_a: u32,
    /// Final score of side B.
    pub score_b: u32,
    /// Winner of the set.
    pub winner: Side,
    /// Target score the set was played to.
    pub target: u32,
    /// Whether deuce was enabled.
    pub allow_deuce: bool,
    /// Side A names, top to bottom.
    pub names_a: Vec<String>,
    /// Side B names, top to bottom.
    pub names_b: Vec<String>,
    /// Number of rallies played.
    pub rallies: usize,
    /// RFC 3339 time the set was archived, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
}

impl SetSummary {
    /// Summarize a record, stored at `index` when it is still in history.
    pub fn new(index: Option<usize>, record: &SetRecord) -> Self {
        Self {
            index,
            set_no: record.set_no,
            score_a: record.score_a,
            score_b: record.score_b,
            winner: record.winner(),
            target: record.target,
            allow_deuce: record.allow_deuce,
            names_a: record.names.a.clone(),
            names_b: record.names.b.clone(),
            rallies: record.rallies.len(),
            ended_at: format_millis(record.ended_at),
        }
    }
}

/// Full scoreboard state returned by `GET /match` and pushed over SSE.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    /// Number of the set in play.
    pub set_no: u32,
    /// Per-side board.
    pub sides: SidesView,
    /// Player holding serve.
    pub serving: ServingView,
    /// Side chosen to serve first in this set.
    pub initial_serve_side: Side,
    /// Whether the first rally of the set has been played.
    pub initial_serve_applied: bool,
    /// Scoring rules.
    pub settings: SettingsView,
    /// Whether an undo would change anything.
    pub can_undo: bool,
    /// Rallies played in the current set.
    pub rallies: usize,
    /// Finished sets, oldest first.
    pub history: Vec<SetSummary>,
    /// Outcome of the latest save.
    pub save_status: SaveStatus,
}

impl MatchView {
    /// Project the engine into the scoreboard view.
    pub fn from_engine(engine: &MatchEngine, save_status: SaveStatus) -> Self {
        let state = engine.state();
        let order = engine.display_order_for_ui();
        let side_view = |side: Side| {
            let names = state.players[side].clone();
            let keys = order.side(side);
            let positions = state.rotation.positions[side];
            SideView {
                score: state.scores.get(side),
                display: keys.iter().map(|key| names.get(*key).to_string()).collect(),
                display_keys: keys.to_vec(),
                names,
                right: positions.right,
                left: positions.left,
                last_server: state.rotation.last_server[side],
                can_serve_first: engine.can_change_initial_serve(side),
            }
        };

        Self {
            set_no: state.scores.set_no,
            sides: SidesView {
                a: side_view(Side::A),
                b: side_view(Side::B),
            },
            serving: ServingView {
                side: state.rotation.serving.side,
                member: state.rotation.serving.member,
                label: state.rotation.serving.tag().to_string(),
            },
            initial_serve_side: state.initial_serve.side,
            initial_serve_applied: state.initial_serve.applied,
            settings: SettingsView {
                target_points: state.settings.target_points,
                allow_deuce: state.settings.allow_deuce,
                cap: state.settings.cap(),
                cumulative: state.settings.cumulative,
            },
            can_undo: engine.can_undo(),
            rallies: state.rallies.len(),
            history: state
                .history
                .iter()
                .enumerate()
                .map(|(index, record)| SetSummary::new(Some(index), record))
                .collect(),
            save_status,
        }
    }
}

/// Payload for `POST /match/points`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PointRequest {
    /// Side winning the rally.
    pub side: Side,
}

/// Response to a recorded point.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PointResponse {
    /// Set closed by this point, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_set: Option<SetSummary>,
    /// Scoreboard after the point.
    #[serde(rename = "match")]
    pub view: MatchView,
}

/// What an undo request did.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UndoKind {
    /// Nothing to undo.
    Nothing,
    /// Last point of the set taken back.
    PointReverted,
    /// A finished set was reopened.
    SetReopened,
}

/// Response to `POST /match/undo`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UndoResponse {
    /// What happened.
    pub outcome: UndoKind,
    /// Set reopened by the undo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reopened_set: Option<u32>,
    /// Scoreboard after the undo.
    #[serde(rename = "match")]
    pub view: MatchView,
}

impl UndoResponse {
    /// Pair an engine outcome with the resulting view.
    pub fn new(outcome: UndoOutcome, view: MatchView) -> Self {
        let (outcome, reopened_set) = match outcome {
            UndoOutcome::Nothing => (UndoKind::Nothing, None),
            UndoOutcome::PointReverted => (UndoKind::PointReverted, None),
            UndoOutcome::SetReopened { set_no } => (UndoKind::SetReopened, Some(set_no)),
        };
        Self {
            outcome,
            reopened_set,
            view,
        }
    }
}

/// Payload for `POST /match/finish`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FinishRequest {
    /// `true` starts the next set, `false` resets the whole match after archiving.
    #[serde(default)]
    pub auto: bool,
}

impl FinishRequest {
    /// Engine mode matching the request.
    pub fn mode(&self) -> FinishMode {
        if self.auto {
            FinishMode::Advance
        } else {
            FinishMode::Reset
        }
    }
}

/// Response to an explicit set finish.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinishResponse {
    /// The archived set.
    pub finished_set: SetSummary,
    /// Scoreboard afterwards.
    #[serde(rename = "match")]
    pub view: MatchView,
}

/// Payload for `PUT /match/serve`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ServeRequest {
    /// Side serving first.
    pub side: Side,
    /// Member serving first.
    #[serde(default)]
    pub member: Member,
}

/// Payload for `PUT /match/serve-side`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ServeSideRequest {
    /// Side serving first; its first member serves.
    pub side: Side,
}

/// Payload for `PUT /match/settings`. Unusable targets fall back to 21.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    /// New target score.
    #[serde(default)]
    pub target_points: Option<u32>,
    /// Whether deuce applies.
    #[serde(default)]
    pub allow_deuce: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{engine::ResetPolicy, model::Settings};
    use serde_json::json;

    #[test]
    fn fresh_view_uses_default_layout() {
        let mut engine = MatchEngine::fresh(Settings::default(), ResetPolicy::KeepRoster);
        engine.set_serve_side(Side::B).unwrap();
        let view = MatchView::from_engine(&engine, SaveStatus::Idle);
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["setNo"], json!(1));
        assert_eq!(value["serving"]["label"], json!("B1"));
        assert_eq!(value["sides"]["A"]["display"], json!(["Player A2", "Player A1"]));
        assert_eq!(value["sides"]["B"]["displayKeys"], json!(["p1", "p2"]));
        assert_eq!(value["sides"]["A"]["canServeFirst"], json!(true));
        assert_eq!(value["settings"]["cap"], json!(30));
        assert_eq!(value["saveStatus"], json!("idle"));
        assert_eq!(value["canUndo"], json!(false));
    }

    #[test]
    fn history_is_summarized() {
        let mut engine = MatchEngine::fresh(Settings::default(), ResetPolicy::KeepRoster);
        engine.update_settings(Some(3), Some(false));
        for _ in 0..3 {
            engine.add_point(Side::B);
        }
        let view = MatchView::from_engine(&engine, SaveStatus::Saved);

        assert_eq!(view.set_no, 2);
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.history[0].winner, Side::B);
        assert_eq!(view.history[0].rallies, 3);
        assert!(view.history[0].ended_at.is_some());
        assert!(view.sides.b.can_serve_first);
        assert!(!view.sides.a.can_serve_first);
    }

    #[test]
    fn finish_request_defaults_to_reset() {
        let request: FinishRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.mode(), FinishMode::Reset);
        let request: FinishRequest = serde_json::from_str(r#"{"auto":true}"#).unwrap();
        assert_eq!(request.mode(), FinishMode::Advance);
    }
}
