//! The match engine: score, serve rotation, set completion and undo for a
//! doubles match.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use crate::state::{
    model::{
        Member, NamesByKey, PerSide, PlayerDb, Players, Rally, Score, SetRecord, Settings, Side,
        Slot, clamp_target_points, placeholder_players,
    },
    rotation::{DisplayOrder, InitialServe, RotationState, resolve_serve},
    snapshot::{PointLog, Snapshot},
};

/// Everything the scoreboard persists about a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    /// Scoring rules.
    pub settings: Settings,
    /// Assigned names.
    pub players: Players,
    /// Score of the current set.
    pub scores: Score,
    /// Undo stack for the current set.
    pub point_log: PointLog,
    /// Rally log of the current set.
    pub rallies: Vec<Rally>,
    /// Finished sets, oldest first.
    pub history: Vec<SetRecord>,
    /// Serve ownership and court halves.
    pub rotation: RotationState,
    /// First-server choice for the current set.
    pub initial_serve: InitialServe,
    /// Which name is drawn on top per side.
    pub display_order: DisplayOrder,
    /// Registered player names.
    pub player_db: PlayerDb,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::fresh(Settings::default())
    }
}

impl MatchState {
    /// A brand-new match using the given rules and placeholder names.
    pub fn fresh(settings: Settings) -> Self {
        Self {
            settings: settings.sanitized(),
            players: placeholder_players(),
            scores: Score::default(),
            point_log: PointLog::default(),
            rallies: Vec::new(),
            history: Vec::new(),
            rotation: RotationState::default(),
            initial_serve: InitialServe::default(),
            display_order: DisplayOrder::default(),
            player_db: PlayerDb::default(),
        }
    }
}

/// What happens to assigned names when the whole match is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Keep the registered roster, put placeholder names back on court.
    #[default]
    KeepRoster,
    /// Keep the registered roster and the names currently on court.
    KeepAssignedNames,
}

/// How an explicitly finished set continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishMode {
    /// Archive the set and start the next one.
    Advance,
    /// Archive the set, then reset the whole match.
    Reset,
}

/// Result of awarding a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointOutcome {
    /// The set goes on.
    Continued,
    /// The point ended the set; the archived record is returned.
    SetFinished(SetRecord),
}

/// Result of an undo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// There was nothing to undo.
    Nothing,
    /// The last point of the current set was taken back.
    PointReverted,
    /// The point that closed set `set_no` was taken back and the set reopened.
    SetReopened {
        /// Number of the reopened set.
        set_no: u32,
    },
}

/// Requests the engine refuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The first server can only change at 0-0 before any point.
    #[error("the first server can only be changed before the first point of a set")]
    ServeLocked,
    /// Only the winner of the previous set may serve first.
    #[error("side {side:?} cannot serve first: side {winner:?} won the previous set")]
    ServeSideNotAllowed {
        /// Side requested.
        side: Side,
        /// Winner of the previous set.
        winner: Side,
    },
    /// The name is already registered.
    #[error("player `{0}` is already registered")]
    DuplicatePlayer(String),
    /// The name is not registered.
    #[error("player `{0}` is not registered")]
    UnknownPlayer(String),
    /// A blank name was supplied where one is required.
    #[error("player name must not be blank")]
    BlankName,
    /// No archived set at that index.
    #[error("no finished set at index {0}")]
    UnknownSet(usize),
}

/// State held after a point closed a set, so the point can be taken back.
#[derive(Debug, Clone)]
struct AutoFinish {
    snapshot: Snapshot,
    point_log: PointLog,
    initial_serve_side: Side,
}

/// Owner of the match state; every scoreboard operation goes through here.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    state: MatchState,
    auto_finish: Option<AutoFinish>,
    defaults: Settings,
    reset_policy: ResetPolicy,
}

impl MatchEngine {
    /// Wrap an existing state (usually restored from storage).
    pub fn new(state: MatchState, defaults: Settings, reset_policy: ResetPolicy) -> Self {
        Self {
            state,
            auto_finish: None,
            defaults: defaults.sanitized(),
            reset_policy,
        }
    }

    /// Start from an empty match.
    pub fn fresh(defaults: Settings, reset_policy: ResetPolicy) -> Self {
        Self::new(MatchState::fresh(defaults.clone()), defaults, reset_policy)
    }

    /// Read access to the whole state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Policy applied by [`MatchEngine::reset_all`].
    pub fn reset_policy(&self) -> ResetPolicy {
        self.reset_policy
    }

    // -----------------------------------------------------------------------
    // Points
    // -----------------------------------------------------------------------

    /// Award a rally to `side`, rotating serve and closing the set if it is won.
    pub fn add_point(&mut self, side: Side) -> PointOutcome {
        let snapshot = Snapshot::capture(&self.state, side);
        let first_rally = !self.state.initial_serve.applied && self.state.scores.is_love_all();
        self.state.point_log.push(snapshot.clone());
        self.state.scores.increment(side);

        let change = resolve_serve(
            &self.state.rotation,
            self.state.initial_serve,
            first_rally,
            side,
        );
        if first_rally {
            self.state.initial_serve.applied = true;
        }
        self.state.rotation.apply(change);
        self.state.display_order.apply(change);

        let rally = Rally {
            rally: self.state.rallies.len() as u32 + 1,
            scorer: side,
            score_a: self.state.scores.a,
            score_b: self.state.scores.b,
            server: self.state.rotation.serving.tag(),
        };
        debug!(
            side = ?side,
            score_a = rally.score_a,
            score_b = rally.score_b,
            server = %rally.server,
            "point recorded"
        );
        self.state.rallies.push(rally);

        if !self.is_set_finished() {
            return PointOutcome::Continued;
        }

        let point_log = self.state.point_log.clone();
        let initial_serve_side = self.state.initial_serve.side;
        let record = self.finish_set(FinishMode::Advance);
        self.auto_finish = Some(AutoFinish {
            snapshot,
            point_log,
            initial_serve_side,
        });
        PointOutcome::SetFinished(record)
    }

    /// Whether the current score closes the set under the active settings.
    pub fn is_set_finished(&self) -> bool {
        let settings = &self.state.settings;
        if settings.cumulative {
            return false;
        }

        let top = self.state.scores.max();
        if settings.allow_deuce {
            top >= settings.cap()
                || (top >= settings.target_points && self.state.scores.lead() >= 2)
        } else {
            top >= settings.target_points
        }
    }

    /// Whether [`MatchEngine::undo_last_point`] would change anything.
    pub fn can_undo(&self) -> bool {
        !self.state.point_log.is_empty() || self.auto_finish.is_some()
    }

    /// Take back the last point, reopening the previous set if that point closed it.
    pub fn undo_last_point(&mut self) -> UndoOutcome {
        if let Some(snapshot) = self.state.point_log.pop() {
            snapshot.restore(&mut self.state);
            return UndoOutcome::PointReverted;
        }

        let Some(AutoFinish {
            snapshot,
            mut point_log,
            initial_serve_side,
        }) = self.auto_finish.take()
        else {
            return UndoOutcome::Nothing;
        };

        // The log was captured after the closing point was pushed.
        point_log.pop();
        snapshot.restore(&mut self.state);
        self.state.point_log = point_log;
        self.state.initial_serve.side = initial_serve_side;
        self.state.history.pop();
        debug!(set_no = self.state.scores.set_no, "automatic set finish undone");
        UndoOutcome::SetReopened {
            set_no: self.state.scores.set_no,
        }
    }

    // -----------------------------------------------------------------------
    // Sets
    // -----------------------------------------------------------------------

    /// Archive the current set, then either start the next set or reset the match.
    pub fn finish_set(&mut self, mode: FinishMode) -> SetRecord {
        self.auto_finish = None;
        let record = self.archive_current_set();
        self.state.history.push(record.clone());
        debug!(
            set_no = record.set_no,
            score_a = record.score_a,
            score_b = record.score_b,
            mode = ?mode,
            "set finished"
        );

        match mode {
            FinishMode::Advance => {
                self.advance_to_next_set(record.winner());
                self.state.point_log.clear();
            }
            FinishMode::Reset => self.reset_all(),
        }

        record
    }

    /// Start the next set at 0-0 with the winner's first member serving.
    pub fn advance_to_next_set(&mut self, winner: Side) {
        self.state.scores = Score {
            a: 0,
            b: 0,
            set_no: self.state.scores.set_no + 1,
        };
        self.state.rotation.start_with(winner, Member::One);
        self.state.display_order = DisplayOrder::default();
        self.state.initial_serve = InitialServe::default();
        self.state.rallies.clear();
    }

    fn archive_current_set(&self) -> SetRecord {
        let state = &self.state;
        SetRecord {
            set_no: state.scores.set_no,
            score_a: state.scores.a,
            score_b: state.scores.b,
            target: state.settings.target_points,
            allow_deuce: state.settings.allow_deuce,
            server: state.rotation.serving,
            names: PerSide::new(self.names_top_down(Side::A), self.names_top_down(Side::B)),
            names_by_key: Some(NamesByKey::from_players(&state.players)),
            rallies: state.rallies.clone(),
            serve_side: state.initial_serve.side,
            initial_serve_side: Some(state.initial_serve.side),
            ended_at: now_millis(),
        }
    }

    /// Names of a side in display order, top first.
    pub fn names_top_down(&self, side: Side) -> Vec<String> {
        self.state
            .display_order
            .side(side)
            .iter()
            .map(|key| self.state.players[side].get(*key).to_string())
            .collect()
    }

    /// Display order the scoreboard should draw: the structural default until
    /// the first rally of the match, the live order afterwards.
    pub fn display_order_for_ui(&self) -> DisplayOrder {
        if self.state.scores.is_love_all() && self.state.history.is_empty() {
            DisplayOrder::default()
        } else {
            self.state.display_order
        }
    }

    /// Archived set at `index`.
    pub fn set_record(&self, index: usize) -> Result<&SetRecord, MatchError> {
        self.state
            .history
            .get(index)
            .ok_or(MatchError::UnknownSet(index))
    }

    // -----------------------------------------------------------------------
    // Initial serve
    // -----------------------------------------------------------------------

    /// Whether `side` may be chosen to serve first right now.
    pub fn can_change_initial_serve(&self, side: Side) -> bool {
        self.check_initial_serve(side).is_ok()
    }

    fn check_initial_serve(&self, side: Side) -> Result<(), MatchError> {
        if !self.state.scores.is_love_all() || !self.state.point_log.is_empty() {
            return Err(MatchError::ServeLocked);
        }
        if self.state.scores.set_no == 1 {
            return Ok(());
        }
        match self.state.history.last() {
            Some(last) if last.winner() != side => Err(MatchError::ServeSideNotAllowed {
                side,
                winner: last.winner(),
            }),
            _ => Ok(()),
        }
    }

    /// Choose the first server of the set.
    pub fn set_initial_serve(&mut self, side: Side, member: Member) -> Result<(), MatchError> {
        self.check_initial_serve(side)?;
        self.state.rotation.start_with(side, member);
        self.state.initial_serve = InitialServe {
            side,
            applied: false,
        };
        Ok(())
    }

    /// Choose the side serving first; its first member serves.
    pub fn set_serve_side(&mut self, side: Side) -> Result<(), MatchError> {
        self.set_initial_serve(side, Member::One)
    }

    // -----------------------------------------------------------------------
    // Resets and settings
    // -----------------------------------------------------------------------

    /// Replace the match with a fresh one, keeping the roster and, depending on
    /// the reset policy, the assigned names.
    pub fn reset_all(&mut self) {
        let player_db = std::mem::take(&mut self.state.player_db);
        let players = std::mem::take(&mut self.state.players);

        let mut fresh = MatchState::fresh(self.defaults.clone());
        fresh.player_db = player_db;
        if self.reset_policy == ResetPolicy::KeepAssignedNames {
            fresh.players = players;
        }

        self.state = fresh;
        self.auto_finish = None;
    }

    /// Forget every finished set and number the current set as the first.
    pub fn clear_history(&mut self) {
        self.state.history.clear();
        self.state.scores.set_no = 1;
        self.auto_finish = None;
    }

    /// Change scoring rules; out-of-range targets fall back to the default.
    pub fn update_settings(&mut self, target_points: Option<u32>, allow_deuce: Option<bool>) {
        if let Some(target) = target_points {
            self.state.settings.target_points = clamp_target_points(target);
        }
        if let Some(allow) = allow_deuce {
            self.state.settings.allow_deuce = allow;
        }
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    /// Register a name; returns `false` for blanks and duplicates.
    pub fn add_player_to_db(&mut self, name: &str) -> bool {
        self.state.player_db.insert(name.trim())
    }

    /// Unregister a name and blank every slot that holds it.
    pub fn delete_player(&mut self, name: &str) -> bool {
        let removed = self.state.player_db.remove(name);
        self.for_each_name(|current| {
            if current == name {
                current.clear();
            }
        });
        removed
    }

    /// Rename a registered player everywhere.
    pub fn edit_player_name(&mut self, old: &str, new: &str) -> Result<(), MatchError> {
        let new = new.trim();
        if new.is_empty() || new == old {
            return Ok(());
        }
        if self.state.player_db.contains(new) {
            return Err(MatchError::DuplicatePlayer(new.to_string()));
        }

        self.state.player_db.rename(old, new);
        self.for_each_name(|current| {
            if current == old {
                *current = new.to_string();
            }
        });
        Ok(())
    }

    /// Put `name` in a scoreboard slot. If the name already sits in another
    /// slot, the two slots exchange names.
    pub fn assign_player_to_slot(&mut self, name: &str, slot: Slot) -> Result<(), MatchError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MatchError::BlankName);
        }

        let key = self.state.display_order.key_at(slot.side, slot.row);
        let current = self.state.players[slot.side].get(key).to_string();
        if current != name {
            let found = Side::ALL.into_iter().rev().find_map(|side| {
                [Member::Two, Member::One]
                    .into_iter()
                    .map(Member::key)
                    .find(|k| self.state.players[side].get(*k) == name)
                    .map(|k| (side, k))
            });
            if let Some((side, k)) = found
                && (side, k) != (slot.side, key)
            {
                *self.state.players[side].get_mut(k) = current;
            }
            *self.state.players[slot.side].get_mut(key) = name.to_string();
        }

        self.state.player_db.insert(name);
        Ok(())
    }

    /// Exchange the names shown in two slots.
    pub fn swap_slots(&mut self, source: Slot, target: Slot) {
        if source == target {
            return;
        }
        let source_key = self.state.display_order.key_at(source.side, source.row);
        let target_key = self.state.display_order.key_at(target.side, target.row);
        let source_name = self.state.players[source.side].get(source_key).to_string();
        let target_name = self.state.players[target.side].get(target_key).to_string();

        *self.state.players[source.side].get_mut(source_key) = target_name.clone();
        *self.state.players[target.side].get_mut(target_key) = source_name.clone();
        self.state.player_db.insert(&source_name);
        self.state.player_db.insert(&target_name);
    }

    /// Name currently shown in a slot.
    pub fn slot_name(&self, slot: Slot) -> &str {
        let key = self.state.display_order.key_at(slot.side, slot.row);
        self.state.players[slot.side].get(key)
    }

    /// Forget the roster and blank every assigned name.
    pub fn reset_player_list(&mut self) {
        self.state.player_db.clear();
        self.for_each_name(String::clear);
    }

    fn for_each_name(&mut self, mut f: impl FnMut(&mut String)) {
        for side in Side::ALL {
            f(&mut self.state.players[side].p1);
            f(&mut self.state.players[side].p2);
        }
    }
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
