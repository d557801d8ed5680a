//! Walls and their building blocks.
//!
//! A wall is a transverse slice of the cargo hold: an ordered run of
//! columns left to right, one strapping operation. Aggregate fields
//! (`width_fill`, `max_height`, `depth`, `min_depth`) are maintained on
//! every mutation so the packing phases can test acceptance in O(1).

use crate::{Case, Rotation};

/// Stability classification of a wall, from most stable (placed deepest,
/// toward the cab) to least stable (placed at the door).
///
/// The tiers form a total order; demotion takes the worse of the current
/// and proposed value and never promotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Reliability {
    /// Single-group grid at high fill.
    FullWall = 1,
    /// Built from a knowledge-base recipe (reserved; the universal mode
    /// never produces these).
    KbCombo = 2,
    /// Full wall that accepted same-department gap fill.
    TightFit = 3,
    /// Rescued orphans sharing a department.
    OrphanSameDept = 4,
    /// Rescued orphans across departments.
    OrphanMixed = 5,
}

impl Reliability {
    pub fn tier(self) -> u32 {
        self as u32
    }

    /// Worse of the two classifications. Used for every demotion site so a
    /// wall can never silently regain reliability.
    pub fn demote(self, proposed: Reliability) -> Reliability {
        self.max(proposed)
    }

    /// Human-readable tag used in stage labels.
    pub fn label(self) -> &'static str {
        match self {
            Reliability::FullWall => "full wall",
            Reliability::KbCombo => "recipe",
            Reliability::TightFit => "tight fit",
            Reliability::OrphanSameDept => "orphans",
            Reliability::OrphanMixed => "mixed orphans",
        }
    }
}

/// One vertical stack of identical cases at a specific x offset within a
/// wall. Owns its cases; `cases.len() == count`.
#[derive(Debug, Clone)]
pub struct Column {
    pub group: String,
    pub dept: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub count: u32,
    pub rotation: Rotation,
    pub cases: Vec<Case>,
    /// Offset relative to the wall-local origin (left edge).
    pub x_off: f64,
}

impl Column {
    pub fn stacked_height(&self) -> f64 {
        self.height * self.count as f64
    }
}

/// A zero-case pseudo-wall inserted between floor-panel rows. Consumes
/// y-space but emits no placements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadBarSpacer {
    pub depth: f64,
}

impl LoadBarSpacer {
    pub fn new(depth: f64) -> Self {
        Self { depth }
    }
}

/// The floor phase emits an alternating run of panel walls and load-bar
/// spacers which is prepended verbatim at emission.
#[derive(Debug, Clone)]
pub enum FloorItem {
    Wall(Wall),
    Spacer(LoadBarSpacer),
}

/// A transverse slab of cases. See the module docs for the aggregate
/// maintenance contract.
#[derive(Debug, Clone)]
pub struct Wall {
    pub columns: Vec<Column>,
    pub width_fill: f64,
    pub max_height: f64,
    /// Max column depth; the y-extent the wall consumes.
    pub depth: f64,
    /// Min column depth; carried so the flat-face range (depth - min_depth)
    /// can be tested during accretion.
    pub min_depth: f64,
    /// Contributing group tags in first-contribution order.
    pub groups: Vec<String>,
    pub reliability: Reliability,
    pub flat_top: bool,
    pub is_floor: bool,
}

impl Wall {
    pub fn new(reliability: Reliability) -> Self {
        Self {
            columns: Vec::new(),
            width_fill: 0.0,
            max_height: 0.0,
            depth: 0.0,
            min_depth: f64::INFINITY,
            groups: Vec::new(),
            reliability,
            flat_top: false,
            is_floor: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn case_count(&self) -> usize {
        self.columns.iter().map(|c| c.cases.len()).sum()
    }

    pub fn fill_ratio(&self, truck_width: f64) -> f64 {
        if truck_width > 0.0 {
            self.width_fill / truck_width
        } else {
            0.0
        }
    }

    /// Door-facing depth spread across columns. Zero for an empty wall.
    pub fn depth_range(&self) -> f64 {
        if self.columns.is_empty() {
            0.0
        } else {
            self.depth - self.min_depth
        }
    }

    /// Spread between the tallest and shortest column stack.
    pub fn height_range(&self) -> f64 {
        let mut lo = f64::INFINITY;
        let mut hi: f64 = 0.0;
        for col in &self.columns {
            let h = col.stacked_height();
            lo = lo.min(h);
            hi = hi.max(h);
        }
        if self.columns.is_empty() { 0.0 } else { hi - lo }
    }

    /// True when appending a column of the given footprint keeps the wall
    /// inside the truck width and inside the flat-face depth tolerance.
    pub fn accepts(&self, width: f64, depth: f64, truck_width: f64, depth_tol: f64) -> bool {
        if self.width_fill + width > truck_width + crate::EPS {
            return false;
        }
        if self.columns.is_empty() {
            return true;
        }
        let hi = self.depth.max(depth);
        let lo = self.min_depth.min(depth);
        hi - lo <= depth_tol
    }

    /// Append a column at the current right edge. The column's `x_off` is
    /// assigned here; callers hand over columns with a placeholder offset.
    pub fn push_column(&mut self, mut column: Column) {
        column.x_off = self.width_fill;
        self.width_fill += column.width;
        self.max_height = self.max_height.max(column.stacked_height());
        self.depth = self.depth.max(column.depth);
        self.min_depth = self.min_depth.min(column.depth);
        if !self.groups.iter().any(|g| *g == column.group) {
            self.groups.push(column.group.clone());
        }
        self.columns.push(column);
    }

    /// Remove every column, returning them for redistribution. The wall is
    /// left empty with reset aggregates.
    pub fn take_columns(&mut self) -> Vec<Column> {
        let cols = std::mem::take(&mut self.columns);
        self.width_fill = 0.0;
        self.max_height = 0.0;
        self.depth = 0.0;
        self.min_depth = f64::INFINITY;
        self.groups.clear();
        cols
    }

    /// Rebuild aggregates and x offsets after columns were removed out of
    /// band (weak-wall dissolution keeps the survivors packed left).
    pub fn recompute(&mut self) {
        let cols = std::mem::take(&mut self.columns);
        self.width_fill = 0.0;
        self.max_height = 0.0;
        self.depth = 0.0;
        self.min_depth = f64::INFINITY;
        self.groups.clear();
        for col in cols {
            self.push_column(col);
        }
    }

    pub fn demote(&mut self, proposed: Reliability) {
        self.reliability = self.reliability.demote(proposed);
    }

    /// Department contributing the most cases; ties resolve to the
    /// department seen first in column order.
    pub fn majority_dept(&self) -> &str {
        let mut tally: Vec<(&str, usize)> = Vec::new();
        for col in &self.columns {
            match tally.iter_mut().find(|(d, _)| *d == col.dept) {
                Some((_, n)) => *n += col.cases.len(),
                None => tally.push((col.dept.as_str(), col.cases.len())),
            }
        }
        let mut best: &str = "GENERAL";
        let mut best_n = 0usize;
        for (dept, n) in tally {
            if n > best_n {
                best = dept;
                best_n = n;
            }
        }
        best
    }
}
