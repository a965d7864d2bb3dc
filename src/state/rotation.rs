//! Serve rotation rules for doubles.
//!
//! Court state is split in two: [`RotationState`] is the domain view (who
//! serves, who stands right or left, who served last for each side) and
//! [`DisplayOrder`] is the presentation view (which name is drawn on top).
//! They only meet in [`resolve_serve`], which turns a won rally into a
//! [`ServeChange`] that both views then apply.

use serde::{Deserialize, Serialize};

use crate::state::model::{Member, PerSide, PlayerKey, Serving, Side};

/// Court halves of one pair while serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidePositions {
    /// Member standing in the right service court.
    pub right: Member,
    /// Member standing in the left service court.
    pub left: Member,
}

impl Default for SidePositions {
    fn default() -> Self {
        Self {
            right: Member::One,
            left: Member::Two,
        }
    }
}

impl SidePositions {
    /// Positions with `server` on the right and the partner on the left.
    pub fn with_right(server: Member) -> Self {
        Self {
            right: server,
            left: server.partner(),
        }
    }

    /// Partners exchange service courts.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.right, &mut self.left);
    }
}

/// Domain rotation state: serve ownership and court halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RotationState {
    /// Player currently holding serve.
    pub serving: Serving,
    /// Right/left assignment per side.
    pub positions: PerSide<SidePositions>,
    /// Member who last took serve for each side.
    pub last_server: PerSide<Member>,
}

impl RotationState {
    /// Hand the serve to `side`/`member` at the start of a set.
    pub fn start_with(&mut self, side: Side, member: Member) {
        self.serving = Serving { side, member };
        self.last_server[side] = member;
        self.positions = PerSide::default();
    }

    /// Apply the domain half of a serve change.
    pub fn apply(&mut self, change: ServeChange) {
        match change {
            ServeChange::Retained { side } => self.positions[side].swap(),
            ServeChange::Transferred { side, member } => {
                self.serving = Serving { side, member };
                self.last_server[side] = member;
                self.positions[side] = SidePositions::with_right(member);
            }
        }
    }
}

/// Presentation order of names per side: `[top, bottom]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayOrder(PerSide<[PlayerKey; 2]>);

impl Default for DisplayOrder {
    fn default() -> Self {
        Self(PerSide::new(
            [PlayerKey::P2, PlayerKey::P1],
            [PlayerKey::P1, PlayerKey::P2],
        ))
    }
}

impl DisplayOrder {
    /// Keys of one side, top first.
    pub fn side(&self, side: Side) -> [PlayerKey; 2] {
        self.0[side]
    }

    /// Key drawn in `row` (0 = top) of a side.
    pub fn key_at(&self, side: Side, row: usize) -> PlayerKey {
        self.0[side][row.min(1)]
    }

    /// Flip top and bottom for a side.
    pub fn reverse(&mut self, side: Side) {
        self.0[side].reverse();
    }

    /// Whether both keys of every side are distinct.
    pub fn is_valid(&self) -> bool {
        self.0.a[0] != self.0.a[1] && self.0.b[0] != self.0.b[1]
    }

    /// Apply the presentation half of a serve change.
    pub fn apply(&mut self, change: ServeChange) {
        if let ServeChange::Retained { side } = change {
            self.reverse(side);
        }
    }
}

/// First-server choice for the set and whether its one-time rule has fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitialServe {
    /// Side chosen to serve first in this set.
    pub side: Side,
    /// Whether the first rally of the set has been resolved.
    pub applied: bool,
}

/// Outcome of one rally for the serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeChange {
    /// The serving player keeps serve and `side` swaps service courts.
    Retained {
        /// Side whose partners swap courts.
        side: Side,
    },
    /// Serve passes to `member` of `side`.
    Transferred {
        /// Side gaining serve.
        side: Side,
        /// Member who serves next.
        member: Member,
    },
}

/// Decide how serve changes after `scoring` wins a rally.
///
/// `first_rally` must be true only for the first rally of a set whose
/// initial-serve rule has not fired yet. When side B was chosen to serve first
/// and wins that rally, B keeps serve and swaps courts even if the structural
/// serve still sits with A; every other case follows the regular rules. Side A
/// has no mirrored rule.
pub fn resolve_serve(
    rotation: &RotationState,
    initial: InitialServe,
    first_rally: bool,
    scoring: Side,
) -> ServeChange {
    if first_rally && initial.side == Side::B && scoring == Side::B {
        return ServeChange::Retained { side: Side::B };
    }

    if scoring == rotation.serving.side {
        return ServeChange::Retained { side: scoring };
    }

    ServeChange::Transferred {
        side: scoring,
        member: rotation.last_server[scoring].partner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serving_side_point_keeps_server_and_swaps_courts() {
        let mut rotation = RotationState::default();
        let change = resolve_serve(&rotation, InitialServe::default(), true, Side::A);
        assert_eq!(change, ServeChange::Retained { side: Side::A });

        rotation.apply(change);
        assert_eq!(rotation.serving, Serving::default());
        assert_eq!(rotation.positions.a.right, Member::Two);
        assert_eq!(rotation.positions.a.left, Member::One);
        assert_eq!(rotation.positions.b, SidePositions::default());
    }

    #[test]
    fn receiving_side_point_alternates_server() {
        let mut rotation = RotationState::default();
        let change = resolve_serve(&rotation, InitialServe::default(), false, Side::B);
        assert_eq!(
            change,
            ServeChange::Transferred {
                side: Side::B,
                member: Member::Two
            }
        );

        rotation.apply(change);
        assert_eq!(rotation.serving.side, Side::B);
        assert_eq!(rotation.serving.member, Member::Two);
        assert_eq!(rotation.last_server.b, Member::Two);
        assert_eq!(rotation.positions.b, SidePositions::with_right(Member::Two));

        // A regains serve: its last server was 1, so 2 serves now.
        let change = resolve_serve(&rotation, InitialServe::default(), false, Side::A);
        rotation.apply(change);
        assert_eq!(rotation.serving.member, Member::Two);
        assert_eq!(rotation.last_server.a, Member::Two);
    }

    #[test]
    fn first_rally_rule_only_fires_for_side_b() {
        let mut rotation = RotationState::default();
        rotation.start_with(Side::A, Member::One);
        let b_first = InitialServe {
            side: Side::B,
            applied: false,
        };

        let change = resolve_serve(&rotation, b_first, true, Side::B);
        assert_eq!(change, ServeChange::Retained { side: Side::B });

        let change = resolve_serve(&rotation, b_first, true, Side::A);
        assert_eq!(change, ServeChange::Retained { side: Side::A });

        let change = resolve_serve(&rotation, b_first, false, Side::B);
        assert!(matches!(change, ServeChange::Transferred { side: Side::B, .. }));
    }

    #[test]
    fn display_order_only_follows_retained_serve() {
        let mut order = DisplayOrder::default();
        order.apply(ServeChange::Transferred {
            side: Side::B,
            member: Member::Two,
        });
        assert_eq!(order, DisplayOrder::default());

        order.apply(ServeChange::Retained { side: Side::A });
        assert_eq!(order.side(Side::A), [PlayerKey::P1, PlayerKey::P2]);
        assert_eq!(order.side(Side::B), [PlayerKey::P1, PlayerKey::P2]);
    }
}
