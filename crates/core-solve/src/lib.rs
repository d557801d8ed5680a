//! The wall planner solver.
//!
//! `solve` is a pure synchronous function: an unordered case inventory
//! plus a truck envelope in, an ordered sequence of wall sections with
//! exact placements out. There are no suspension points, no shared
//! resources, and no I/O; all mutation happens on owned intermediate
//! data never visible outside the call.
//!
//! Determinism is a hard contract: identical inputs produce
//! byte-identical outputs, including placement order and wall
//! identifiers. Every keyed traversal in the pipeline is
//! insertion-ordered and every sort is stable, so no hashing order can
//! leak into the result.
//!
//! Pipeline (phases are never re-entered):
//! 0.   split mixed-dimension group tags
//! 1.   packing geometry + rotation oracle
//! 1.5  floor-panel walls with load-bar spacers
//! 2    single-group full walls
//! 2.5  same-department gap fill
//! 3A   knowledge-base recipes (reserved, no-op)
//! 3B   depth-grouped orphan rescue + weak-wall merge
//! 3C   weak-wall absorption
//! 3D   column-level rebuild
//! 4    scoring and stage ordering
//! 5    coordinate emission, spillover recovery
//! then observational validation.
//!
//! Packing infeasibility is never an error: an overloaded truck simply
//! yields sections past the truck length, which callers observe via
//! `LoadPlan::depth_used`.

use core_config::{Config, KbPattern, Tuning};
use core_inventory::{ingest, resolve_group_rotation, split_groups};
use core_model::{
    CaseSpec, DeptPriority, DiagEvent, Diagnostics, LoadPlan, TruckEnvelope,
};
use core_pack::{
    absorb_weak_walls, apply_kb_patterns, build_full_walls, emit_floor_walls, gap_fill,
    merge_weak_walls, rebuild_weak_walls, rescue_orphans,
};
use thiserror::Error;
use tracing::info;

pub mod emit;
pub mod order;
pub mod validate;

pub use emit::EmitOutcome;
pub use order::{StagedWall, rank_and_stage, wall_score};
pub use validate::validate_plan;

/// The only fatal failure mode. Everything recoverable (empty input,
/// invalid cases, spillovers, violations) is reported through
/// diagnostics on a successful return.
#[derive(Debug, Error)]
pub enum SolveError {
    /// An algorithmic invariant was breached; the plan in progress is
    /// unusable.
    #[error("internal invariant breached: {0}")]
    Internal(String),
}

/// Caller-side knobs for one solve run.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    pub tuning: Tuning,
    /// Explicit department priorities; anything unspecified falls back
    /// to the derived ordering.
    pub dept_priority: Vec<(String, u32)>,
    /// Reserved; a populated set is logged and ignored.
    pub kb_patterns: Vec<KbPattern>,
}

impl SolveOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tuning: config.tuning,
            dept_priority: config
                .file
                .dept_priority
                .iter()
                .map(|(tag, pri)| (tag.clone(), *pri))
                .collect(),
            kb_patterns: config.file.kb_patterns.clone(),
        }
    }
}

/// Plan a load. See the module docs for the pipeline; see `LoadPlan` for
/// what comes back.
pub fn solve(
    specs: &[CaseSpec],
    envelope: TruckEnvelope,
    options: &SolveOptions,
) -> Result<LoadPlan, SolveError> {
    let mut diag = Diagnostics::new();

    if specs.is_empty() {
        info!(target: "solve", "empty_input");
        diag.note("empty input: nothing to plan");
        return Ok(LoadPlan {
            placements: Vec::new(),
            wall_sections: Vec::new(),
            diagnostics: diag,
        });
    }
    if !envelope.is_valid() {
        info!(
            target: "solve",
            width = envelope.width,
            length = envelope.length,
            height = envelope.height,
            "envelope_unusable"
        );
        for spec in specs {
            diag.push(DiagEvent::InvalidCase {
                name: spec.name.clone(),
                reason: "truck envelope unusable".to_string(),
            });
        }
        return Ok(LoadPlan {
            placements: Vec::new(),
            wall_sections: Vec::new(),
            diagnostics: diag,
        });
    }

    let tuning = &options.tuning;
    let cases = ingest(specs, &mut diag);
    let mut priority = DeptPriority::derive(cases.iter().map(|c| c.dept.as_str()));
    for (tag, pri) in &options.dept_priority {
        priority.set(tag, *pri);
    }

    // Phases 0-1: uniform groups, oriented for row fill.
    let groups = split_groups(cases, &mut diag);
    info!(target: "solve", groups = groups.len(), "inventory_staged");
    let (floor_groups, mut rest): (Vec<_>, Vec<_>) =
        groups.into_iter().partition(|g| g.is_floor);
    resolve_group_rotation(&mut rest, &envelope);

    // Phase 1.5: substrate first.
    let floor_items = emit_floor_walls(floor_groups, &envelope, tuning, &mut diag);
    let has_floor = !floor_items.is_empty();

    // Phase 2 / 2.5: the full-wall core and its gap fill.
    let (mut walls, mut pools) = build_full_walls(rest, &envelope, tuning, &mut diag);
    gap_fill(&mut walls, &mut pools, &envelope, tuning, &mut diag);

    // Phase 3A: reserved recipe hook.
    walls.extend(apply_kb_patterns(&options.kb_patterns, &mut diag));

    // Phase 3B: orphan rescue, then weak-wall accretion.
    let rescued = rescue_orphans(&mut pools, &envelope, tuning, &mut diag);
    walls.extend(rescued);
    merge_weak_walls(&mut walls, &envelope, tuning, &mut diag);

    // Phases 3C / 3D: consolidation.
    absorb_weak_walls(&mut walls, &envelope, tuning, &mut diag);
    rebuild_weak_walls(&mut walls, &mut pools, &envelope, tuning, &mut diag);

    // Phase 4: cab-to-door ordering.
    let first_stage = if has_floor { 1 } else { 0 };
    let staged = rank_and_stage(walls, &envelope, tuning, &priority, first_stage, &mut diag);

    // Phase 5 / 5B: coordinates, then recovery.
    let outcome = emit::emit_plan(floor_items, staged, &envelope, &mut diag)?;
    validate_plan(
        &outcome.placements,
        &outcome.sections,
        &envelope,
        tuning,
        &mut diag,
    );

    let counters = diag.counters();
    info!(
        target: "solve",
        placements = outcome.placements.len(),
        sections = outcome.sections.len(),
        walls_built = counters.walls_built,
        merged = counters.walls_merged,
        absorbed = counters.columns_absorbed,
        rebuilt = counters.walls_rebuilt,
        spillovers = counters.spillovers,
        violations = counters.violations,
        "solve_done"
    );
    Ok(LoadPlan {
        placements: outcome.placements,
        wall_sections: outcome.sections,
        diagnostics: diag,
    })
}
