//! The persisted match document and its migration from older layouts.
//!
//! The document is one flat camelCase JSON object. Keys the server does not
//! model (view mode, voice settings, future tournament entities) are carried
//! through untouched so a UI sharing the document keeps its own preferences.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use serde_with::{DefaultOnError, FromInto, serde_as};
use tracing::warn;

use crate::state::{
    engine::MatchState,
    model::{
        DEFAULT_TARGET_POINTS, Member, PerSide, PlayerDb, Rally, Score, Serving, SetRecord,
        Settings, Side, TeamNames, clamp_target_points, placeholder_players,
    },
    rotation::{DisplayOrder, InitialServe, RotationState, SidePositions},
    snapshot::PointLog,
};

/// Keys reserved for tournament features, written as empty values when absent.
const RESERVED_KEYS: [&str; 4] = ["tournament", "entries", "matches", "approvals"];

/// Document keys the server does not interpret, preserved across rewrites.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentExtras {
    /// Unknown top-level keys.
    pub root: Map<String, Value>,
    /// Unknown keys inside `settings`.
    pub settings: Map<String, Value>,
}

/// Scoring rules as stored, tolerant of missing or mistyped values.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDocument {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    target_points: Option<u32>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    allow_deuce: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    cumulative: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Names of a pair as stored; older documents used a single `name`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamNamesDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl TeamNamesDocument {
    fn into_names(self, fallback: &TeamNames) -> TeamNames {
        TeamNames {
            p1: self.p1.or(self.name).unwrap_or_else(|| fallback.p1.clone()),
            p2: self.p2.unwrap_or_else(|| fallback.p2.clone()),
        }
    }
}

impl From<&TeamNames> for TeamNamesDocument {
    fn from(names: &TeamNames) -> Self {
        Self {
            p1: Some(names.p1.clone()),
            p2: Some(names.p2.clone()),
            name: None,
        }
    }
}

/// A per-side object as stored; a missing side takes its default.
#[derive(Debug, Deserialize)]
struct PartialSides<T> {
    #[serde(rename = "A")]
    a: Option<T>,
    #[serde(rename = "B")]
    b: Option<T>,
}

impl<T: Default> From<PartialSides<T>> for PerSide<T> {
    fn from(sides: PartialSides<T>) -> Self {
        PerSide::new(sides.a.unwrap_or_default(), sides.b.unwrap_or_default())
    }
}

/// Full persisted document.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDocument {
    #[serde(default)]
    settings: SettingsDocument,
    #[serde_as(deserialize_as = "Option<FromInto<PartialSides<TeamNamesDocument>>>")]
    #[serde(default)]
    players: Option<PerSide<TeamNamesDocument>>,
    #[serde(default)]
    scores: Score,
    // Older builds stored plain strings here; such logs are dropped.
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    point_log: PointLog,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    rallies: Vec<Rally>,
    #[serde(default)]
    history: Vec<SetRecord>,
    #[serde(default)]
    serving: Serving,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    initial_serve_side: Side,
    #[serde(default)]
    initial_serve_applied: bool,
    #[serde_as(deserialize_as = "FromInto<PartialSides<SidePositions>>")]
    #[serde(default)]
    positions: PerSide<SidePositions>,
    #[serde_as(deserialize_as = "FromInto<PartialSides<Member>>")]
    #[serde(default)]
    last_server: PerSide<Member>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    display_order: Option<DisplayOrder>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, rename = "playerDB")]
    player_db: PlayerDb,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl MatchDocument {
    /// Build the document for `state`, re-attaching preserved keys.
    pub fn from_state(state: &MatchState, extras: &DocumentExtras) -> Self {
        let mut root = extras.root.clone();
        for key in RESERVED_KEYS {
            let empty = if key == "tournament" { Value::Null } else { json!([]) };
            root.entry(key).or_insert(empty);
        }

        Self {
            settings: SettingsDocument {
                target_points: Some(state.settings.target_points),
                allow_deuce: Some(state.settings.allow_deuce),
                cumulative: state.settings.cumulative,
                extra: extras.settings.clone(),
            },
            players: Some(state.players.map(|_, names| names.into())),
            scores: state.scores,
            point_log: state.point_log.clone(),
            rallies: state.rallies.clone(),
            history: state.history.clone(),
            serving: state.rotation.serving,
            initial_serve_side: state.initial_serve.side,
            initial_serve_applied: state.initial_serve.applied,
            positions: state.rotation.positions,
            last_server: state.rotation.last_server,
            display_order: Some(state.display_order),
            player_db: state.player_db.clone(),
            extra: root,
        }
    }

    /// Migrate the document into a match state, filling structural defaults.
    pub fn into_state(self) -> (MatchState, DocumentExtras) {
        let settings = Settings {
            target_points: clamp_target_points(
                self.settings.target_points.unwrap_or(DEFAULT_TARGET_POINTS),
            ),
            allow_deuce: self.settings.allow_deuce.unwrap_or(true),
            cumulative: self.settings.cumulative,
        };

        let fallback = placeholder_players();
        let players = match self.players {
            Some(players) => PerSide::new(
                players.a.into_names(&fallback.a),
                players.b.into_names(&fallback.b),
            ),
            None => fallback,
        };

        let state = MatchState {
            settings,
            players,
            scores: self.scores,
            point_log: self.point_log,
            rallies: self.rallies,
            history: self.history,
            rotation: RotationState {
                serving: self.serving,
                positions: self.positions,
                last_server: self.last_server,
            },
            initial_serve: InitialServe {
                side: self.initial_serve_side,
                applied: self.initial_serve_applied,
            },
            display_order: self
                .display_order
                .filter(DisplayOrder::is_valid)
                .unwrap_or_default(),
            player_db: self.player_db,
        };

        let extras = DocumentExtras {
            root: self.extra,
            settings: self.settings.extra,
        };
        (state, extras)
    }
}

/// Encode a state as the JSON value written to storage.
pub fn encode(state: &MatchState, extras: &DocumentExtras) -> serde_json::Result<Value> {
    serde_json::to_value(MatchDocument::from_state(state, extras))
}

/// Decode a stored value; malformed documents are reported and treated as absent.
pub fn decode(value: Value) -> Option<(MatchState, DocumentExtras)> {
    match serde_json::from_value::<MatchDocument>(value) {
        Ok(document) => Some(document.into_state()),
        Err(err) => {
            warn!(error = %err, "stored match document is malformed; ignoring it");
            None
        }
    }
}
