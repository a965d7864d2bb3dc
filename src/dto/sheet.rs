use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::state::score_sheet::{ScoreSheet, SheetLane, SheetPage};

/// Query string of the sheet endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SheetQuery {
    /// Columns per page; the server default applies when omitted.
    pub columns: Option<usize>,
}

/// One lane of the sheet.
#[derive(Debug, Serialize, ToSchema)]
pub struct LaneView {
    /// `A1`-style player label.
    pub server: String,
    /// Name shown at the start of the lane.
    pub label: String,
    /// Score written in each column, `null` for blank cells.
    pub cells: Vec<Option<u32>>,
}

impl From<&SheetLane> for LaneView {
    fn from(lane: &SheetLane) -> Self {
        Self {
            server: lane.server.to_string(),
            label: lane.label.clone(),
            cells: lane.cells.clone(),
        }
    }
}

/// A printable slice of the sheet.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    /// First column on the page.
    pub start: usize,
    /// Last column on the page, inclusive.
    pub end: usize,
    /// Lanes limited to the page.
    pub lanes: Vec<LaneView>,
    /// Serve-change columns on the page.
    pub serve_changes: Vec<usize>,
}

impl From<&SheetPage> for PageView {
    fn from(page: &SheetPage) -> Self {
        Self {
            start: page.start,
            end: page.end,
            lanes: page.lanes.iter().map(LaneView::from).collect(),
            serve_changes: page.serve_changes.clone(),
        }
    }
}

/// Score sheet of the live set or of an archived one.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetResponse {
    /// Set number.
    pub set_no: u32,
    /// Whether the set is still being played.
    pub in_progress: bool,
    /// Score of side A.
    pub score_a: u32,
    /// Score of side B.
    pub score_b: u32,
    /// Side A names, top to bottom.
    pub names_a: Vec<String>,
    /// Side B names, top to bottom.
    pub names_b: Vec<String>,
    /// Number of finished sets in the match.
    pub finished_sets: usize,
    /// Total columns, seed included.
    pub columns: usize,
    /// Columns where serve changed hands.
    pub serve_changes: Vec<usize>,
    /// Full lanes.
    pub lanes: Vec<LaneView>,
    /// Lanes split into pages.
    pub pages: Vec<PageView>,
}

/// Header values of a sheet that do not come from the projection.
#[derive(Debug)]
pub struct SheetHeader {
    /// Set number.
    pub set_no: u32,
    /// Whether the set is still being played.
    pub in_progress: bool,
    /// Score of side A.
    pub score_a: u32,
    /// Score of side B.
    pub score_b: u32,
    /// Side A names, top to bottom.
    pub names_a: Vec<String>,
    /// Side B names, top to bottom.
    pub names_b: Vec<String>,
    /// Number of finished sets in the match.
    pub finished_sets: usize,
}

impl SheetResponse {
    /// Assemble the response from a projected sheet.
    pub fn new(header: SheetHeader, sheet: &ScoreSheet, page_columns: usize) -> Self {
        Self {
            set_no: header.set_no,
            in_progress: header.in_progress,
            score_a: header.score_a,
            score_b: header.score_b,
            names_a: header.names_a,
            names_b: header.names_b,
            finished_sets: header.finished_sets,
            columns: sheet.columns(),
            serve_changes: sheet.serve_changes().collect(),
            lanes: sheet.lanes().iter().map(LaneView::from).collect(),
            pages: sheet.pages(page_columns).iter().map(PageView::from).collect(),
        }
    }
}
