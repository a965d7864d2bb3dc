//! Score-sheet projection: the rally log laid out per server, one column per
//! rally, the way a paper badminton score sheet is written.

use std::collections::BTreeSet;

use crate::state::model::{NamesByKey, Rally, ServerTag, Side};

/// Narrowest page the sheet is split into.
pub const MIN_PAGE_COLUMNS: usize = 4;

/// One row of the sheet: the points scored while `server` held serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLane {
    /// Player the row belongs to.
    pub server: ServerTag,
    /// Display label: the player's name, or the `A1`-style tag when unnamed.
    pub label: String,
    /// Column 0 is the seed, column `i` holds the scorer's total after rally `i`.
    pub cells: Vec<Option<u32>>,
}

/// Projected score sheet of a single set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSheet {
    lanes: Vec<SheetLane>,
    serve_changes: BTreeSet<usize>,
    columns: usize,
}

/// A printable slice of the sheet covering columns `start..=end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPage {
    /// First column on the page.
    pub start: usize,
    /// Last column on the page, inclusive.
    pub end: usize,
    /// Lanes restricted to the page's columns.
    pub lanes: Vec<SheetLane>,
    /// Columns of this page where serve changed hands.
    pub serve_changes: Vec<usize>,
}

impl ScoreSheet {
    /// Lay out `rallies` for a set whose first server belonged to `first_server_side`.
    ///
    /// Players without a name in `names` fall back to their tag as label.
    pub fn project(rallies: &[Rally], first_server_side: Side, names: &NamesByKey) -> Self {
        let columns = rallies.len() + 1;
        let seed = ServerTag::first_of(first_server_side);

        let mut lanes = ServerTag::ALL
            .iter()
            .map(|&server| {
                let name = names.get(server);
                SheetLane {
                    server,
                    label: if name.is_empty() {
                        server.to_string()
                    } else {
                        name.to_string()
                    },
                    cells: vec![None; columns],
                }
            })
            .collect::<Vec<_>>();

        if let Some(lane) = lanes.iter_mut().find(|lane| lane.server == seed) {
            lane.cells[0] = Some(0);
        }

        let mut serve_changes = BTreeSet::new();
        let mut previous = seed;
        for (index, rally) in rallies.iter().enumerate() {
            let column = index + 1;
            if let Some(lane) = lanes.iter_mut().find(|lane| lane.server == rally.server) {
                lane.cells[column] = Some(rally.scorer_points());
            }
            if rally.server != previous {
                serve_changes.insert(column);
            }
            previous = rally.server;
        }

        Self {
            lanes,
            serve_changes,
            columns,
        }
    }

    /// The four lanes in `A1, A2, B1, B2` order.
    pub fn lanes(&self) -> &[SheetLane] {
        &self.lanes
    }

    /// Columns where the server differs from the previous column's server.
    pub fn serve_changes(&self) -> impl Iterator<Item = usize> + '_ {
        self.serve_changes.iter().copied()
    }

    /// Whether serve changed hands at `column`.
    pub fn is_serve_change(&self, column: usize) -> bool {
        self.serve_changes.contains(&column)
    }

    /// Total number of columns, seed included.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Split the sheet into pages of `width` columns (at least [`MIN_PAGE_COLUMNS`]).
    pub fn pages(&self, width: usize) -> Vec<SheetPage> {
        let width = width.max(MIN_PAGE_COLUMNS);
        (0..self.columns)
            .step_by(width)
            .map(|start| {
                let end = (start + width).min(self.columns) - 1;
                SheetPage {
                    start,
                    end,
                    lanes: self
                        .lanes
                        .iter()
                        .map(|lane| SheetLane {
                            server: lane.server,
                            label: lane.label.clone(),
                            cells: lane.cells[start..=end].to_vec(),
                        })
                        .collect(),
                    serve_changes: self.serve_changes.range(start..=end).copied().collect(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::model::{PerSide, TeamNames};

    fn rally(rally: u32, scorer: Side, score_a: u32, score_b: u32, server: &str) -> Rally {
        Rally {
            rally,
            scorer,
            score_a,
            score_b,
            server: server.parse().unwrap(),
        }
    }

    fn names() -> NamesByKey {
        NamesByKey::from_players(&PerSide::new(
            TeamNames {
                p1: "Aki".into(),
                p2: String::new(),
            },
            TeamNames {
                p1: "Bo".into(),
                p2: "Cy".into(),
            },
        ))
    }

    #[test]
    fn empty_set_only_has_seed() {
        let sheet = ScoreSheet::project(&[], Side::B, &names());
        assert_eq!(sheet.columns(), 1);
        let seeded = sheet
            .lanes()
            .iter()
            .filter(|lane| lane.cells[0].is_some())
            .map(|lane| lane.server.to_string())
            .collect::<Vec<_>>();
        assert_eq!(seeded, vec!["B1"]);
        assert_eq!(sheet.serve_changes().count(), 0);
    }

    #[test]
    fn scores_land_in_server_lane_and_mark_serve_changes() {
        let rallies = [
            rally(1, Side::A, 1, 0, "A1"),
            rally(2, Side::B, 1, 1, "B2"),
            rally(3, Side::B, 1, 2, "B2"),
            rally(4, Side::A, 2, 2, "A2"),
        ];
        let sheet = ScoreSheet::project(&rallies, Side::A, &names());
        let lanes = sheet.lanes();

        assert_eq!(lanes[0].label, "Aki");
        assert_eq!(lanes[1].label, "A2");
        assert_eq!(lanes[0].cells, vec![Some(0), Some(1), None, None, None]);
        assert_eq!(lanes[1].cells, vec![None, None, None, None, Some(2)]);
        assert_eq!(lanes[3].cells, vec![None, None, Some(1), Some(2), None]);
        assert_eq!(sheet.serve_changes().collect::<Vec<_>>(), vec![2, 4]);
        assert!(sheet.is_serve_change(2));
        assert!(!sheet.is_serve_change(1));
    }

    #[test]
    fn pages_never_narrower_than_minimum() {
        let rallies = (1..=9)
            .map(|n| rally(n, Side::A, n, 0, "A1"))
            .collect::<Vec<_>>();
        let sheet = ScoreSheet::project(&rallies, Side::A, &names());
        let pages = sheet.pages(2);

        assert_eq!(pages.len(), 3);
        assert_eq!((pages[0].start, pages[0].end), (0, 3));
        assert_eq!((pages[2].start, pages[2].end), (8, 9));
        assert_eq!(pages[2].lanes[0].cells, vec![Some(8), Some(9)]);
    }
}
