//! Solver output records: placements, wall sections, and the aggregate
//! load plan handed back to callers.

use crate::diag::Diagnostics;
use crate::CaseId;
use serde::Serialize;

/// One physical case located inside the cargo hold. Coordinates are the
/// near-left-bottom corner; extents run toward the door, the right wall,
/// and the roof.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub name: String,
    pub case_id: CaseId,
    pub group: String,
    pub dept: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    /// Orientation in degrees (0 or 90).
    pub rotation: u16,
    pub wall_id: String,
    /// Stage the owning wall belongs to; -1 marks spillover recovery.
    pub stage_index: i32,
}

/// A wall after coordinate emission: its y-extent, fill, and the subset of
/// placements it owns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WallSection {
    pub id: String,
    pub label: String,
    pub stage: i32,
    pub y_start: f64,
    pub y_end: f64,
    pub wall_width: f64,
    pub fill_pct: f64,
    pub placements: Vec<Placement>,
    pub case_count: usize,
    pub depth: f64,
}

/// Complete solver output. `y_end` of the last section exceeding the truck
/// length is an observable condition, not an error.
#[derive(Debug, Clone, Default)]
pub struct LoadPlan {
    pub placements: Vec<Placement>,
    pub wall_sections: Vec<WallSection>,
    pub diagnostics: Diagnostics,
}

impl LoadPlan {
    /// Total y-depth consumed, i.e. the door-side edge of the last section.
    pub fn depth_used(&self) -> f64 {
        self.wall_sections
            .iter()
            .map(|s| s.y_end)
            .fold(0.0, f64::max)
    }
}
