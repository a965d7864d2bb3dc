//! Value types shared by the match engine, the score-sheet projector and the
//! persisted document.

use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use utoipa::ToSchema;

/// One of the two doubles pairs on court.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum Side {
    /// Pair listed first on the scoreboard; the structural default server.
    #[default]
    A,
    /// Pair listed second on the scoreboard.
    B,
}

impl Side {
    /// Both sides in scoreboard order.
    pub const ALL: [Side; 2] = [Side::A, Side::B];

    /// The other pair.
    pub fn opponent(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    fn as_char(self) -> char {
        match self {
            Side::A => 'A',
            Side::B => 'B',
        }
    }
}

/// Player number inside a pair. Persisted as the strings `"1"` / `"2"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub enum Member {
    /// First registered player of the pair.
    #[default]
    #[serde(rename = "1")]
    One,
    /// Second registered player of the pair.
    #[serde(rename = "2")]
    Two,
}

impl Member {
    /// The partner of this member.
    pub fn partner(self) -> Self {
        match self {
            Member::One => Member::Two,
            Member::Two => Member::One,
        }
    }

    /// Name slot holding this member's display name.
    pub fn key(self) -> PlayerKey {
        match self {
            Member::One => PlayerKey::P1,
            Member::Two => PlayerKey::P2,
        }
    }

    fn as_char(self) -> char {
        match self {
            Member::One => '1',
            Member::Two => '2',
        }
    }
}

/// Older documents wrote members as numbers, newer ones as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum MemberRepr {
    Text(String),
    Number(u8),
}

/// Error raised when a member value is neither 1 nor 2.
#[derive(Debug, Error)]
#[error("invalid member `{0}`: expected 1 or 2")]
pub struct InvalidMember(String);

impl TryFrom<MemberRepr> for Member {
    type Error = InvalidMember;

    fn try_from(value: MemberRepr) -> Result<Self, Self::Error> {
        match value {
            MemberRepr::Text(text) => match text.trim() {
                "1" => Ok(Member::One),
                "2" => Ok(Member::Two),
                _ => Err(InvalidMember(text)),
            },
            MemberRepr::Number(1) => Ok(Member::One),
            MemberRepr::Number(2) => Ok(Member::Two),
            MemberRepr::Number(other) => Err(InvalidMember(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Member {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = MemberRepr::deserialize(deserializer)?;
        Member::try_from(repr).map_err(serde::de::Error::custom)
    }
}

/// Key of a display-name slot inside a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PlayerKey {
    /// Name of member 1.
    #[serde(rename = "p1")]
    P1,
    /// Name of member 2.
    #[serde(rename = "p2")]
    P2,
}

/// A value held once per side, serialized as `{"A": .., "B": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerSide<T> {
    /// Value for side A.
    #[serde(rename = "A")]
    pub a: T,
    /// Value for side B.
    #[serde(rename = "B")]
    pub b: T,
}

impl<T> PerSide<T> {
    /// Build from explicit values.
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Iterate `(side, value)` pairs in scoreboard order.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        [(Side::A, &self.a), (Side::B, &self.b)].into_iter()
    }

    /// Transform both values.
    pub fn map<U>(&self, mut f: impl FnMut(Side, &T) -> U) -> PerSide<U> {
        PerSide {
            a: f(Side::A, &self.a),
            b: f(Side::B, &self.b),
        }
    }
}

impl<T> Index<Side> for PerSide<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }
}

impl<T> IndexMut<Side> for PerSide<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }
}

/// Running score of the current set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Score {
    /// Points won by side A in this set.
    #[serde(rename = "A")]
    pub a: u32,
    /// Points won by side B in this set.
    #[serde(rename = "B")]
    pub b: u32,
    /// One-based number of the set being played.
    #[serde(rename = "setNo")]
    pub set_no: u32,
}

impl Default for Score {
    fn default() -> Self {
        Self {
            a: 0,
            b: 0,
            set_no: 1,
        }
    }
}

impl Score {
    /// Points of one side.
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::A => self.a,
            Side::B => self.b,
        }
    }

    /// Award one point to `side`.
    pub fn increment(&mut self, side: Side) {
        match side {
            Side::A => self.a += 1,
            Side::B => self.b += 1,
        }
    }

    /// True before the first rally of a set.
    pub fn is_love_all(&self) -> bool {
        self.a == 0 && self.b == 0
    }

    /// Highest score of the two sides.
    pub fn max(&self) -> u32 {
        self.a.max(self.b)
    }

    /// Absolute point difference between the sides.
    pub fn lead(&self) -> u32 {
        self.a.abs_diff(self.b)
    }
}

/// The player currently holding serve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Serving {
    /// Side holding serve.
    pub side: Side,
    /// Member of that side who serves.
    pub member: Member,
}

impl Serving {
    /// Compact `<side><member>` label used by rallies and the score sheet.
    pub fn tag(&self) -> ServerTag {
        ServerTag {
            side: self.side,
            member: self.member,
        }
    }
}

/// `"A1"`-style label identifying one of the four players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct ServerTag {
    /// Side of the player.
    pub side: Side,
    /// Member number of the player.
    pub member: Member,
}

impl ServerTag {
    /// The four players in score-sheet row order.
    pub const ALL: [ServerTag; 4] = [
        ServerTag {
            side: Side::A,
            member: Member::One,
        },
        ServerTag {
            side: Side::A,
            member: Member::Two,
        },
        ServerTag {
            side: Side::B,
            member: Member::One,
        },
        ServerTag {
            side: Side::B,
            member: Member::Two,
        },
    ];

    /// First server of a side, the seed row of a score sheet.
    pub fn first_of(side: Side) -> Self {
        Self {
            side,
            member: Member::One,
        }
    }
}

impl fmt::Display for ServerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.side.as_char(), self.member.as_char())
    }
}

/// Error raised when parsing a malformed server label.
#[derive(Debug, Error)]
#[error("invalid server label `{0}`")]
pub struct InvalidServerTag(String);

impl FromStr for ServerTag {
    type Err = InvalidServerTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let side = match s.get(..1) {
            Some("A") => Side::A,
            Some("B") => Side::B,
            _ => return Err(InvalidServerTag(s.to_string())),
        };
        let member = match s.get(1..) {
            Some("1") => Member::One,
            Some("2") => Member::Two,
            _ => return Err(InvalidServerTag(s.to_string())),
        };
        Ok(Self { side, member })
    }
}

/// A scoreboard slot: side plus top (`0`) or bottom (`1`) display row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub struct Slot {
    /// Side the slot belongs to.
    pub side: Side,
    /// Row in the display order (0 = top, 1 = bottom).
    pub row: usize,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.side.as_char(), self.row)
    }
}

/// Error raised when parsing a malformed slot label.
#[derive(Debug, Error)]
#[error("invalid slot `{0}`: expected A0, A1, B0 or B1")]
pub struct InvalidSlot(String);

impl FromStr for Slot {
    type Err = InvalidSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A0" => Ok(Slot { side: Side::A, row: 0 }),
            "A1" => Ok(Slot { side: Side::A, row: 1 }),
            "B0" => Ok(Slot { side: Side::B, row: 0 }),
            "B1" => Ok(Slot { side: Side::B, row: 1 }),
            _ => Err(InvalidSlot(s.to_string())),
        }
    }
}

/// Display names of the two members of a pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct TeamNames {
    /// Name of member 1.
    pub p1: String,
    /// Name of member 2.
    pub p2: String,
}

impl TeamNames {
    /// Name held by one key.
    pub fn get(&self, key: PlayerKey) -> &str {
        match key {
            PlayerKey::P1 => &self.p1,
            PlayerKey::P2 => &self.p2,
        }
    }

    /// Mutable name slot for one key.
    pub fn get_mut(&mut self, key: PlayerKey) -> &mut String {
        match key {
            PlayerKey::P1 => &mut self.p1,
            PlayerKey::P2 => &mut self.p2,
        }
    }
}

/// Assigned names for both pairs.
pub type Players = PerSide<TeamNames>;

/// Placeholder names used by a fresh scoreboard.
pub fn placeholder_players() -> Players {
    PerSide::new(
        TeamNames {
            p1: "Player A1".into(),
            p2: "Player A2".into(),
        },
        TeamNames {
            p1: "Player B1".into(),
            p2: "Player B2".into(),
        },
    )
}

/// Registered player names, unique and kept in insertion order.
///
/// Persisted as `[{"name": ..}]` objects; bare strings are accepted on load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerDb(IndexSet<String>);

impl PlayerDb {
    /// Register a name; returns `false` when it was already known or blank.
    pub fn insert(&mut self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        self.0.insert(name.to_string())
    }

    /// Whether the name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Remove a name, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> bool {
        self.0.shift_remove(name)
    }

    /// Replace `old` with `new` at the same position.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let Some(index) = self.0.get_index_of(old) else {
            return false;
        };
        let (inserted_at, _) = self.0.insert_full(new.to_string());
        self.0.swap_indices(index, inserted_at);
        self.0.shift_remove(old);
        true
    }

    /// Iterate registered names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no name is registered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Forget every registered name.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PlayerEntry {
    Named { name: String },
    Bare(String),
}

impl Serialize for PlayerDb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|name| PlayerEntry::Named { name: name.clone() }))
    }
}

impl<'de> Deserialize<'de> for PlayerDb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<PlayerEntry>::deserialize(deserializer)?;
        let mut db = PlayerDb::default();
        for entry in entries {
            let name = match entry {
                PlayerEntry::Named { name } | PlayerEntry::Bare(name) => name,
            };
            db.insert(name.trim());
        }
        Ok(db)
    }
}

impl FromIterator<String> for PlayerDb {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut db = PlayerDb::default();
        for name in iter {
            db.insert(&name);
        }
        db
    }
}

/// Target score used when the configured value is unusable.
pub const DEFAULT_TARGET_POINTS: u32 = 21;
const MAX_TARGET_POINTS: u32 = 99;

/// User-adjustable scoring rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Points needed to win a set.
    pub target_points: u32,
    /// Whether a two-point lead is required, up to a hard cap.
    pub allow_deuce: bool,
    /// Legacy mode where sets never end automatically.
    #[serde(default)]
    pub cumulative: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_points: DEFAULT_TARGET_POINTS,
            allow_deuce: true,
            cumulative: false,
        }
    }
}

impl Settings {
    /// Clamp the target score into a playable range.
    pub fn sanitized(mut self) -> Self {
        self.target_points = clamp_target_points(self.target_points);
        self
    }

    /// Score at which a set ends regardless of the lead.
    pub fn cap(&self) -> u32 {
        if !self.allow_deuce {
            self.target_points
        } else if self.target_points == 21 {
            30
        } else {
            self.target_points + 5
        }
    }
}

/// Map out-of-range target scores to [`DEFAULT_TARGET_POINTS`].
pub fn clamp_target_points(value: u32) -> u32 {
    if (1..=MAX_TARGET_POINTS).contains(&value) {
        value
    } else {
        DEFAULT_TARGET_POINTS
    }
}

/// One finished rally of the current set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rally {
    /// One-based rally number inside the set.
    pub rally: u32,
    /// Side that won the rally.
    pub scorer: Side,
    /// Score of side A after the rally.
    pub score_a: u32,
    /// Score of side B after the rally.
    pub score_b: u32,
    /// Player holding serve once the rally was resolved.
    pub server: ServerTag,
}

impl Rally {
    /// Score of the winning side after this rally.
    pub fn scorer_points(&self) -> u32 {
        match self.scorer {
            Side::A => self.score_a,
            Side::B => self.score_b,
        }
    }
}

/// Names of the four players keyed by their `A1`..`B2` labels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamesByKey {
    #[serde(rename = "A1")]
    a1: String,
    #[serde(rename = "A2")]
    a2: String,
    #[serde(rename = "B1")]
    b1: String,
    #[serde(rename = "B2")]
    b2: String,
}

impl NamesByKey {
    /// Capture the current name assignment.
    pub fn from_players(players: &Players) -> Self {
        Self {
            a1: players.a.p1.clone(),
            a2: players.a.p2.clone(),
            b1: players.b.p1.clone(),
            b2: players.b.p2.clone(),
        }
    }

    /// Name of one player.
    pub fn get(&self, tag: ServerTag) -> &str {
        match (tag.side, tag.member) {
            (Side::A, Member::One) => &self.a1,
            (Side::A, Member::Two) => &self.a2,
            (Side::B, Member::One) => &self.b1,
            (Side::B, Member::Two) => &self.b2,
        }
    }
}

/// A finished set archived in the match history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRecord {
    /// Number of the set inside the match.
    pub set_no: u32,
    /// Final score of side A.
    pub score_a: u32,
    /// Final score of side B.
    pub score_b: u32,
    /// Target score the set was played to.
    pub target: u32,
    /// Whether deuce was enabled for the set.
    pub allow_deuce: bool,
    /// Player holding serve when the set ended.
    #[serde(default)]
    pub server: Serving,
    /// Names in display order (top, bottom) per side.
    #[serde(default)]
    pub names: PerSide<Vec<String>>,
    /// Names keyed by player label, used to title archived score sheets.
    #[serde(default)]
    pub names_by_key: Option<NamesByKey>,
    /// Full rally log of the set.
    #[serde(default)]
    pub rallies: Vec<Rally>,
    /// Side chosen to serve first.
    #[serde(default)]
    pub serve_side: Side,
    /// Side chosen to serve first, kept under its newer name.
    #[serde(default)]
    pub initial_serve_side: Option<Side>,
    /// Unix timestamp in milliseconds when the set was archived.
    #[serde(default)]
    pub ended_at: i64,
}

impl SetRecord {
    /// Side with the higher final score; ties resolve to B.
    pub fn winner(&self) -> Side {
        if self.score_a > self.score_b {
            Side::A
        } else {
            Side::B
        }
    }

    /// Side whose first member seeds the score sheet.
    pub fn first_server_side(&self) -> Side {
        self.initial_serve_side.unwrap_or(self.serve_side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_accepts_strings_and_numbers() {
        let from_text: Member = serde_json::from_str("\"2\"").unwrap();
        let from_number: Member = serde_json::from_str("1").unwrap();
        assert_eq!(from_text, Member::Two);
        assert_eq!(from_number, Member::One);
        assert!(serde_json::from_str::<Member>("3").is_err());
        assert_eq!(serde_json::to_string(&Member::Two).unwrap(), "\"2\"");
    }

    #[test]
    fn server_tag_round_trips_through_text() {
        let tag: ServerTag = "B2".parse().unwrap();
        assert_eq!(tag.side, Side::B);
        assert_eq!(tag.member, Member::Two);
        assert_eq!(tag.to_string(), "B2");
        assert!("C1".parse::<ServerTag>().is_err());
        assert!("A".parse::<ServerTag>().is_err());
    }

    #[test]
    fn player_db_keeps_order_and_rejects_duplicates() {
        let mut db = PlayerDb::default();
        assert!(db.insert("Kento"));
        assert!(db.insert("Yuta"));
        assert!(!db.insert("Kento"));
        assert!(!db.insert(""));
        assert!(db.rename("Kento", "Kenta"));
        assert_eq!(db.iter().collect::<Vec<_>>(), vec!["Kenta", "Yuta"]);
    }

    #[test]
    fn player_db_accepts_objects_and_strings() {
        let db: PlayerDb = serde_json::from_str(r#"[{"name":"Mika"},"Rin",{"name":"Mika"}]"#).unwrap();
        assert_eq!(db.iter().collect::<Vec<_>>(), vec!["Mika", "Rin"]);
        assert_eq!(
            serde_json::to_string(&db).unwrap(),
            r#"[{"name":"Mika"},{"name":"Rin"}]"#
        );
    }

    #[test]
    fn deuce_cap_depends_on_target() {
        let mut settings = Settings::default();
        assert_eq!(settings.cap(), 30);
        settings.target_points = 15;
        assert_eq!(settings.cap(), 20);
        settings.allow_deuce = false;
        assert_eq!(settings.cap(), 15);
    }

    #[test]
    fn target_points_are_clamped() {
        assert_eq!(clamp_target_points(0), DEFAULT_TARGET_POINTS);
        assert_eq!(clamp_target_points(500), DEFAULT_TARGET_POINTS);
        assert_eq!(clamp_target_points(11), 11);
    }
}
