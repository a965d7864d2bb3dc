//! Point snapshots backing exact undo.

use serde::{Deserialize, Serialize};

use crate::state::{
    engine::MatchState,
    model::{Member, PerSide, Rally, Score, Serving, Side},
    rotation::{DisplayOrder, SidePositions},
};

/// Full copy of the mutable match state taken right before a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Side about to be awarded the point.
    #[serde(default)]
    pub side: Side,
    /// Serving player before the point.
    pub serving: Serving,
    /// Court halves before the point.
    pub positions: PerSide<SidePositions>,
    /// Score before the point.
    pub scores: Score,
    /// Last server per side before the point.
    pub last_server: PerSide<Member>,
    /// Display order before the point.
    pub display_order: DisplayOrder,
    /// Set number before the point.
    pub set_no: u32,
    /// Whether the first-rally rule had already fired.
    pub initial_serve_applied: bool,
    /// Rally log before the point.
    #[serde(default)]
    pub rallies: Vec<Rally>,
}

impl Snapshot {
    /// Copy everything a point can change.
    pub fn capture(state: &MatchState, side: Side) -> Self {
        Self {
            side,
            serving: state.rotation.serving,
            positions: state.rotation.positions,
            scores: state.scores,
            last_server: state.rotation.last_server,
            display_order: state.display_order,
            set_no: state.scores.set_no,
            initial_serve_applied: state.initial_serve.applied,
            rallies: state.rallies.clone(),
        }
    }

    /// Put the captured values back, consuming the snapshot.
    pub fn restore(self, state: &mut MatchState) {
        state.rotation.serving = self.serving;
        state.rotation.positions = self.positions;
        state.rotation.last_server = self.last_server;
        state.scores = self.scores;
        state.scores.set_no = self.set_no;
        state.display_order = self.display_order;
        state.initial_serve.applied = self.initial_serve_applied;
        state.rallies = self.rallies;
    }
}

/// Stack of snapshots for the points of the current set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointLog(Vec<Snapshot>);

impl PointLog {
    /// Record the state preceding a point.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.0.push(snapshot);
    }

    /// Take back the most recent snapshot.
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.0.pop()
    }

    /// Most recent snapshot, if any.
    pub fn last(&self) -> Option<&Snapshot> {
        self.0.last()
    }

    /// Number of points that can be undone inside the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no point has been logged in this set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Forget every snapshot.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_is_exact_even_after_mutation() {
        let mut state = MatchState::default();
        state.scores.a = 4;
        state.scores.b = 2;
        state.display_order.reverse(Side::B);

        let snapshot = Snapshot::capture(&state, Side::A);
        let before = state.clone();

        state.scores.increment(Side::A);
        state.rotation.positions.a.swap();
        state.display_order.reverse(Side::A);
        state.initial_serve.applied = true;

        snapshot.restore(&mut state);
        assert_eq!(state, before);
    }

    #[test]
    fn stack_pops_in_reverse_order() {
        let mut log = PointLog::default();
        let mut state = MatchState::default();
        log.push(Snapshot::capture(&state, Side::A));
        state.scores.increment(Side::A);
        log.push(Snapshot::capture(&state, Side::B));

        assert_eq!(log.len(), 2);
        assert_eq!(log.pop().map(|snap| snap.side), Some(Side::B));
        assert_eq!(log.last().map(|snap| snap.scores.a), Some(0));
        log.clear();
        assert!(log.is_empty());
    }
}
