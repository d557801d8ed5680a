//! Domain model for the wall planner: cases, inventory groups, columns,
//! walls, placements, and the supporting vocabulary types (reliability
//! tiers, department priorities, the truck envelope).
//!
//! Ownership contract: a `Case` moves input list -> inventory group ->
//! column -> placement. The graph is a strict forest; every case is owned
//! by exactly one container at every step of the pipeline, so downstream
//! crates move cases by value and never share mutable references.
//!
//! Core invariants (must hold after every public call):
//! * All cases inside an `InventoryGroup` share identical base dimensions.
//! * A `Column` owns exactly `count` cases.
//! * `Wall::width_fill` equals the sum of its column widths.
//! * `Wall::depth` / `Wall::min_depth` are the max/min column depth.
//! * Reliability demotion is monotone: a wall never gets more reliable.

use serde::{Deserialize, Serialize};

pub mod diag;
pub mod envelope;
pub mod ordered;
pub mod plan;
pub mod wall;

pub use diag::{DiagEvent, Diagnostics, SolveCounters, ViolationKind};
pub use envelope::TruckEnvelope;
pub use ordered::InsertionBuckets;
pub use plan::{LoadPlan, Placement, WallSection};
pub use wall::{Column, FloorItem, LoadBarSpacer, Reliability, Wall};

use std::sync::LazyLock;

/// Width slack tolerated on every comparison against the truck width, and
/// the overlap tolerance used by the validator (inches).
pub const EPS: f64 = 0.5;

/// Stable identifier for an ingested case: dense index in ingestion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseId(pub usize);

/// Base dimensions of a case in inches, pre-rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dims {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Dims {
    pub fn new(width: f64, depth: f64, height: f64) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    /// True when all three extents are strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.depth > 0.0 && self.height > 0.0
    }

    /// Dimensions with width and depth exchanged (a 90 degree rotation
    /// about the vertical axis).
    pub fn rotated(&self) -> Self {
        Self {
            width: self.depth,
            depth: self.width,
            height: self.height,
        }
    }

    /// True when rotating would not change the footprint in any useful way.
    pub fn near_square(&self) -> bool {
        (self.width - self.depth).abs() < EPS
    }
}

/// Horizontal orientation of a case or column. Only two states exist:
/// door-facing as ingested, or yawed a quarter turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    R0,
    R90,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
        }
    }

    /// Composition of two quarter-turn states.
    pub fn compose(self, other: Rotation) -> Rotation {
        match (self, other) {
            (Rotation::R0, r) | (r, Rotation::R0) => r,
            (Rotation::R90, Rotation::R90) => Rotation::R0,
        }
    }
}

/// Input record for a single physical item, as supplied by manifests or
/// upstream collaborators. Missing fields take the documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSpec {
    pub name: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    #[serde(default = "CaseSpec::default_dept")]
    pub dept: String,
    /// Group tag; defaults to the case name when absent.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default = "CaseSpec::default_max_stack")]
    pub max_stack: u32,
    #[serde(default)]
    pub is_floor: bool,
    #[serde(default = "CaseSpec::default_allow_rotation")]
    pub allow_rotation: bool,
    /// Pre-applied orientation in degrees; only 0 and 90 are meaningful.
    #[serde(default)]
    pub rotation: u16,
}

impl CaseSpec {
    fn default_dept() -> String {
        "GENERAL".to_string()
    }
    const fn default_max_stack() -> u32 {
        1
    }
    const fn default_allow_rotation() -> bool {
        true
    }
}

/// An ingested case. Never mutated by the solver; consumed into a
/// placement at emission.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub id: CaseId,
    pub name: String,
    pub dims: Dims,
    pub dept: String,
    pub group: String,
    pub stackable: bool,
    pub max_stack: u32,
    pub is_floor: bool,
    pub allow_rotation: bool,
    pub rotation: Rotation,
}

impl Case {
    /// Normalize a spec into an owned case. A declared 90 degree rotation
    /// is applied here so every later consumer sees resolved dimensions.
    pub fn from_spec(id: CaseId, spec: &CaseSpec) -> Self {
        let mut dims = Dims::new(spec.width, spec.depth, spec.height);
        let mut rotation = Rotation::R0;
        if spec.rotation == 90 {
            dims = dims.rotated();
            rotation = Rotation::R90;
        }
        Self {
            id,
            name: spec.name.clone(),
            dims,
            dept: spec.dept.clone(),
            group: spec.group.clone().unwrap_or_else(|| spec.name.clone()),
            stackable: spec.stackable,
            max_stack: spec.max_stack.max(1),
            is_floor: spec.is_floor,
            allow_rotation: spec.allow_rotation,
            rotation,
        }
    }
}

/// A set of cases sharing group tag, dimensions, and stacking policy.
/// Produced by the Phase 0 split; all downstream code may assume
/// dimensional uniformity within a group.
#[derive(Debug, Clone)]
pub struct InventoryGroup {
    /// Resolved name, possibly carrying a synthetic dimension suffix when
    /// the original tag mixed dimensions (`"Alpha (31x29x36)"`).
    pub name: String,
    /// Resolved dims after the rotation oracle ran.
    pub dims: Dims,
    pub rotation: Rotation,
    pub dept: String,
    pub stackable: bool,
    pub max_stack: u32,
    pub is_floor: bool,
    pub cases: Vec<Case>,
}

impl InventoryGroup {
    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    /// Effective stack ceiling: the declared policy, additionally bounded
    /// by how many units fit under the roof when a roof height is known.
    pub fn stack_limit(&self, truck_height: f64) -> u32 {
        let policy = if self.stackable { self.max_stack.max(1) } else { 1 };
        if truck_height > 0.0 && self.dims.height > 0.0 {
            let roof = ((truck_height + EPS) / self.dims.height).floor() as u32;
            policy.min(roof.max(1))
        } else {
            policy
        }
    }
}

static DIM_SUFFIX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r" \(\d+x\d+x\d+\)$").expect("static pattern"));

/// Strip a synthetic dimension suffix from a group tag, if present.
///
/// Phase 0 invents names like `"Alpha (31x29x36)"`; department lookup must
/// tolerate both the original and the suffixed form, so callers resolve
/// through this single helper rather than matching inline.
pub fn base_group_tag(tag: &str) -> &str {
    match DIM_SUFFIX.find(tag) {
        Some(m) => &tag[..m.start()],
        None => tag,
    }
}

/// Compose the synthetic name for one dimension bucket of a mixed tag.
pub fn split_group_name(tag: &str, dims: &Dims) -> String {
    format!(
        "{} ({}x{}x{})",
        tag,
        dims.width.round() as i64,
        dims.depth.round() as i64,
        dims.height.round() as i64
    )
}

/// Department ordering: lower priority loads closer to the cab.
///
/// Derived from the case list by seeding the well-known production
/// departments and appending unseen tags in first-appearance order.
/// Caller-supplied overrides win over both.
#[derive(Debug, Clone, Default)]
pub struct DeptPriority {
    entries: Vec<(String, u32)>,
}

impl DeptPriority {
    const SEEDS: [(&'static str, u32); 7] = [
        ("LX", 1),
        ("SON", 2),
        ("CARP", 3),
        ("VDO", 4),
        ("PROPS", 5),
        ("COST", 6),
        ("ADM", 7),
    ];

    pub fn seeded() -> Self {
        Self {
            entries: Self::SEEDS
                .iter()
                .map(|(tag, pri)| (tag.to_string(), *pri))
                .collect(),
        }
    }

    /// Derive the full ordering from a case listing: seeds first, then any
    /// unseen department in first-appearance order.
    pub fn derive<'a>(depts: impl Iterator<Item = &'a str>) -> Self {
        let mut this = Self::seeded();
        for dept in depts {
            this.observe(dept);
        }
        this
    }

    /// Register a department tag, appending it after the current worst
    /// priority when unseen. Idempotent for known tags.
    pub fn observe(&mut self, dept: &str) {
        if self.entries.iter().any(|(tag, _)| tag == dept) {
            return;
        }
        let next = self.entries.iter().map(|(_, p)| *p).max().unwrap_or(0) + 1;
        self.entries.push((dept.to_string(), next));
    }

    /// Force a specific priority (caller override). Replaces any derived
    /// value for the tag.
    pub fn set(&mut self, dept: &str, priority: u32) {
        if let Some(entry) = self.entries.iter_mut().find(|(tag, _)| tag == dept) {
            entry.1 = priority;
        } else {
            self.entries.push((dept.to_string(), priority));
        }
    }

    /// Priority for a department tag. Unknown tags rank after everything
    /// already observed.
    pub fn priority_of(&self, dept: &str) -> u32 {
        self.entries
            .iter()
            .find(|(tag, _)| tag == dept)
            .map(|(_, p)| *p)
            .unwrap_or_else(|| self.entries.iter().map(|(_, p)| *p).max().unwrap_or(0) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, w: f64, d: f64, h: f64) -> CaseSpec {
        CaseSpec {
            name: name.to_string(),
            width: w,
            depth: d,
            height: h,
            dept: "GENERAL".to_string(),
            group: None,
            stackable: false,
            max_stack: 1,
            is_floor: false,
            allow_rotation: true,
            rotation: 0,
        }
    }

    #[test]
    fn case_defaults_group_to_name() {
        let c = Case::from_spec(CaseId(0), &spec("Amp Rack", 30.0, 30.0, 40.0));
        assert_eq!(c.group, "Amp Rack");
        assert_eq!(c.rotation, Rotation::R0);
    }

    #[test]
    fn declared_rotation_swaps_footprint() {
        let mut s = spec("Riser", 50.0, 20.0, 12.0);
        s.rotation = 90;
        let c = Case::from_spec(CaseId(1), &s);
        assert_eq!(c.dims.width, 20.0);
        assert_eq!(c.dims.depth, 50.0);
        assert_eq!(c.rotation, Rotation::R90);
    }

    #[test]
    fn base_tag_strips_only_trailing_dim_suffix() {
        assert_eq!(base_group_tag("Alpha (31x29x36)"), "Alpha");
        assert_eq!(base_group_tag("Alpha"), "Alpha");
        // Embedded dims are not a suffix.
        assert_eq!(
            base_group_tag("Alpha (31x29x36) spare"),
            "Alpha (31x29x36) spare"
        );
        assert_eq!(
            split_group_name("Alpha", &Dims::new(31.2, 28.7, 36.0)),
            "Alpha (31x29x36)"
        );
    }

    #[test]
    fn dept_priority_seeds_then_appends() {
        let depts = ["CARP", "RIGG", "LX", "RIGG"];
        let pri = DeptPriority::derive(depts.iter().copied());
        assert_eq!(pri.priority_of("LX"), 1);
        assert_eq!(pri.priority_of("ADM"), 7);
        assert_eq!(pri.priority_of("RIGG"), 8);
        // Unknown tags rank after everything observed.
        assert_eq!(pri.priority_of("NEVER"), 9);
    }

    #[test]
    fn dept_priority_override_wins() {
        let mut pri = DeptPriority::seeded();
        pri.set("SON", 1);
        assert_eq!(pri.priority_of("SON"), 1);
    }

    #[test]
    fn stack_limit_respects_roof() {
        let g = InventoryGroup {
            name: "G".to_string(),
            dims: Dims::new(30.0, 30.0, 40.0),
            rotation: Rotation::R0,
            dept: "GENERAL".to_string(),
            stackable: true,
            max_stack: 4,
            is_floor: false,
            cases: Vec::new(),
        };
        // 110" roof fits two 40" units, not four.
        assert_eq!(g.stack_limit(110.0), 2);
        // Unenforced roof falls back to the declared policy.
        assert_eq!(g.stack_limit(0.0), 4);
    }
}
