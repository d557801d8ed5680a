//! Phase 5: coordinate emission, and Phase 5B: spillover recovery.
//!
//! A single cursor walks cab to door: floor items first (spacers consume
//! y-space and emit nothing), then the staged walls. Wall identifiers
//! are assigned monotonically as `wp_<n>` counting emitted walls in
//! emission order. A column whose cumulative x would leave the hold is
//! never emitted in place; its cases queue for recovery, where they are
//! re-packed by depth bucket into dedicated walls at stage -1.

use crate::SolveError;
use crate::order::StagedWall;
use core_model::{
    Case, Column, DiagEvent, Diagnostics, EPS, FloorItem, InsertionBuckets, Placement,
    Reliability, Rotation, TruckEnvelope, Wall, WallSection,
};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct EmitOutcome {
    pub placements: Vec<Placement>,
    pub sections: Vec<WallSection>,
}

/// A case that could not be emitted in its owning wall, carrying the
/// column footprint it was traveling with.
struct SpilledItem {
    case: Case,
    width: f64,
    depth: f64,
    height: f64,
    rotation: Rotation,
}

struct Cursor {
    y: f64,
    next_wall: usize,
}

/// Walk `[floor items] ++ [staged walls]`, then recover spillovers.
pub fn emit_plan(
    floor: Vec<FloorItem>,
    staged: Vec<StagedWall>,
    envelope: &TruckEnvelope,
    diag: &mut Diagnostics,
) -> Result<EmitOutcome, SolveError> {
    let mut outcome = EmitOutcome::default();
    let mut cursor = Cursor {
        y: 0.0,
        next_wall: 0,
    };
    let mut spilled: Vec<SpilledItem> = Vec::new();

    for item in floor {
        match item {
            FloorItem::Spacer(spacer) => {
                debug!(target: "solve.emit", depth = spacer.depth, "load_bar");
                cursor.y += spacer.depth;
            }
            FloorItem::Wall(wall) => {
                emit_wall(
                    wall,
                    0,
                    "Floor",
                    envelope,
                    &mut cursor,
                    &mut spilled,
                    &mut outcome,
                    diag,
                )?;
            }
        }
    }

    for staged_wall in staged {
        emit_wall(
            staged_wall.wall,
            staged_wall.stage_index,
            &staged_wall.label,
            envelope,
            &mut cursor,
            &mut spilled,
            &mut outcome,
            diag,
        )?;
    }

    recover_spillovers(spilled, envelope, &mut cursor, &mut outcome, diag)?;

    info!(
        target: "solve.emit",
        placements = outcome.placements.len(),
        sections = outcome.sections.len(),
        depth_used = cursor.y,
        "emission_done"
    );
    Ok(outcome)
}

/// Emit one wall at the cursor. Columns that would overflow the truck
/// width queue their cases as spillovers and do not advance the cursor's
/// x; a wall whose columns all spill emits nothing and leaves y alone.
#[allow(clippy::too_many_arguments)]
fn emit_wall(
    wall: Wall,
    stage_index: i32,
    label: &str,
    envelope: &TruckEnvelope,
    cursor: &mut Cursor,
    spilled: &mut Vec<SpilledItem>,
    outcome: &mut EmitOutcome,
    diag: &mut Diagnostics,
) -> Result<(), SolveError> {
    let id = format!("wp_{}", cursor.next_wall);
    let mut cumul_x = 0.0;
    let mut emitted_depth: f64 = 0.0;
    let mut placements = Vec::new();

    for column in wall.columns {
        if column.width <= 0.0 {
            return Err(SolveError::Internal(format!(
                "column of group {} has non-positive width",
                column.group
            )));
        }
        if cumul_x + column.width > envelope.width + EPS {
            for case in column.cases {
                debug!(target: "solve.emit", name = %case.name, "spillover_queued");
                diag.push(DiagEvent::Spillover {
                    name: case.name.clone(),
                });
                spilled.push(SpilledItem {
                    case,
                    width: column.width,
                    depth: column.depth,
                    height: column.height,
                    rotation: column.rotation,
                });
            }
            continue;
        }
        emitted_depth = emitted_depth.max(column.depth);
        for (level, case) in column.cases.into_iter().enumerate() {
            let height = if case.dims.height > 0.0 {
                case.dims.height
            } else {
                column.height
            };
            placements.push(Placement {
                name: case.name.clone(),
                case_id: case.id,
                group: column.group.clone(),
                dept: column.dept.clone(),
                x: cumul_x,
                y: cursor.y,
                z: level as f64 * column.height,
                width: column.width,
                depth: column.depth,
                height,
                rotation: column.rotation.degrees(),
                wall_id: id.clone(),
                stage_index,
            });
        }
        cumul_x += column.width;
    }

    if placements.is_empty() {
        return Ok(());
    }

    let y_end = cursor.y + emitted_depth;
    debug!(
        target: "solve.emit",
        id = %id,
        label,
        y_start = cursor.y,
        y_end,
        cases = placements.len(),
        "wall_emitted"
    );
    outcome.sections.push(WallSection {
        id,
        label: label.to_string(),
        stage: stage_index,
        y_start: cursor.y,
        y_end,
        wall_width: cumul_x,
        fill_pct: cumul_x / envelope.width * 100.0,
        placements: placements.clone(),
        case_count: placements.len(),
        depth: emitted_depth,
    });
    outcome.placements.extend(placements);
    cursor.y = y_end;
    cursor.next_wall += 1;
    Ok(())
}

/// Phase 5B: bucket spilled cases by rounded depth, pack each bucket
/// widest-first, and emit the recovery walls after all regular stages at
/// stage -1. Recovery never re-spills: an oversize case is emitted alone
/// and left for the validator to flag.
fn recover_spillovers(
    spilled: Vec<SpilledItem>,
    envelope: &TruckEnvelope,
    cursor: &mut Cursor,
    outcome: &mut EmitOutcome,
    diag: &mut Diagnostics,
) -> Result<(), SolveError> {
    if spilled.is_empty() {
        return Ok(());
    }
    info!(
        target: "solve.emit",
        cases = spilled.len(),
        "spillover_recovery"
    );

    let mut buckets: InsertionBuckets<i64, SpilledItem> = InsertionBuckets::new();
    for item in spilled {
        buckets.push(item.depth.round() as i64, item);
    }

    for (_depth, mut items) in buckets.into_entries() {
        items.sort_by(|a, b| {
            b.width
                .partial_cmp(&a.width)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut wall = Wall::new(Reliability::OrphanMixed);
        for item in items {
            if !wall.is_empty() && wall.width_fill + item.width > envelope.width + EPS {
                let closed = std::mem::replace(&mut wall, Wall::new(Reliability::OrphanMixed));
                emit_recovery_wall(closed, envelope, cursor, outcome)?;
            }
            wall.push_column(Column {
                group: item.case.group.clone(),
                dept: item.case.dept.clone(),
                width: item.width,
                depth: item.depth,
                height: item.height,
                count: 1,
                rotation: item.rotation,
                cases: vec![item.case],
                x_off: 0.0,
            });
        }
        if !wall.is_empty() {
            emit_recovery_wall(wall, envelope, cursor, outcome)?;
        }
    }
    diag.note(format!(
        "spillover recovery: {} wall(s) appended at stage -1",
        outcome.sections.iter().filter(|s| s.stage == -1).count()
    ));
    Ok(())
}

fn emit_recovery_wall(
    wall: Wall,
    envelope: &TruckEnvelope,
    cursor: &mut Cursor,
    outcome: &mut EmitOutcome,
) -> Result<(), SolveError> {
    let id = format!("wp_{}", cursor.next_wall);
    let mut cumul_x = 0.0;
    let mut placements = Vec::new();
    let depth = wall.depth;
    for column in wall.columns {
        for (level, case) in column.cases.into_iter().enumerate() {
            let height = if case.dims.height > 0.0 {
                case.dims.height
            } else {
                column.height
            };
            placements.push(Placement {
                name: case.name.clone(),
                case_id: case.id,
                group: column.group.clone(),
                dept: column.dept.clone(),
                x: cumul_x,
                y: cursor.y,
                z: level as f64 * column.height,
                width: column.width,
                depth: column.depth,
                height,
                rotation: column.rotation.degrees(),
                wall_id: id.clone(),
                stage_index: -1,
            });
        }
        cumul_x += column.width;
    }
    if placements.is_empty() {
        return Err(SolveError::Internal(
            "recovery wall closed without cases".to_string(),
        ));
    }
    let y_end = cursor.y + depth;
    debug!(
        target: "solve.emit",
        id = %id,
        y_start = cursor.y,
        y_end,
        cases = placements.len(),
        "spillover_wall_emitted"
    );
    outcome.sections.push(WallSection {
        id,
        label: "Spillover".to_string(),
        stage: -1,
        y_start: cursor.y,
        y_end,
        wall_width: cumul_x,
        fill_pct: cumul_x / envelope.width * 100.0,
        placements: placements.clone(),
        case_count: placements.len(),
        depth,
    });
    outcome.placements.extend(placements);
    cursor.y = y_end;
    cursor.next_wall += 1;
    Ok(())
}
