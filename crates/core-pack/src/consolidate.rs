//! Phases 3C and 3D: consolidation of what the rescue passes left weak.
//!
//! 3C dissolves very weak orphan walls column-by-column into stronger
//! neighbors. 3D is the heavier hammer: when two or more sub-minimum
//! walls survive, their columns (plus any residual pool cases) are
//! thrown back into one flat list and walls are rebuilt around the
//! widest anchors with a weighted best-fit score.

use crate::take_column;
use core_config::Tuning;
use core_model::{
    Column, DiagEvent, Diagnostics, InventoryGroup, Reliability, TruckEnvelope, Wall,
};
use tracing::{debug, info};

/// Phase 3C: any orphan wall below the absorb threshold is dissolved;
/// each of its columns migrates to the first stronger wall that keeps a
/// strappable face and has width to spare. Unplaceable columns stay with
/// the (recomputed) source wall.
pub fn absorb_weak_walls(
    walls: &mut Vec<Wall>,
    envelope: &TruckEnvelope,
    tuning: &Tuning,
    diag: &mut Diagnostics,
) {
    let width = envelope.width;
    let mut i = 0;
    while i < walls.len() {
        let weak = walls[i].reliability >= Reliability::OrphanSameDept
            && walls[i].fill_ratio(width) < tuning.absorb_thresh;
        if !weak {
            i += 1;
            continue;
        }
        let columns = walls[i].take_columns();
        let mut kept = Vec::new();
        for column in columns {
            let target = walls.iter().enumerate().position(|(j, cand)| {
                j != i
                    && !cand.is_empty()
                    && (cand.reliability <= Reliability::TightFit
                        || cand.fill_ratio(width) >= tuning.absorb_thresh)
                    && (cand.depth - column.depth).abs() <= tuning.depth_relaxed
                    && cand.accepts(column.width, column.depth, width, tuning.depth_relaxed)
            });
            match target {
                Some(j) => {
                    debug!(
                        target: "solve.consolidate",
                        group = %column.group,
                        into = %walls[j].groups.join("+"),
                        "column_absorbed"
                    );
                    diag.push(DiagEvent::Absorb {
                        group: column.group.clone(),
                        into: walls[j].groups.join("+"),
                    });
                    walls[j].push_column(column);
                    walls[j].demote(Reliability::OrphanMixed);
                }
                None => kept.push(column),
            }
        }
        if kept.is_empty() {
            walls.remove(i);
            // The next wall slid into position i.
        } else {
            for column in kept {
                walls[i].push_column(column);
            }
            i += 1;
        }
    }
}

/// Phase 3D: column-level rebuild. Runs only when at least two orphan
/// walls remain below the minimum fill; those walls and any residual
/// pool cases are decomposed and repacked widest-anchor-first.
pub fn rebuild_weak_walls(
    walls: &mut Vec<Wall>,
    pools: &mut [InventoryGroup],
    envelope: &TruckEnvelope,
    tuning: &Tuning,
    diag: &mut Diagnostics,
) {
    let width = envelope.width;
    let weak = |w: &Wall| {
        w.reliability >= Reliability::OrphanSameDept && w.fill_ratio(width) < tuning.min_fill
    };
    if walls.iter().filter(|w| weak(w)).count() < 2 {
        return;
    }

    let mut columns: Vec<Column> = Vec::new();
    walls.retain_mut(|wall| {
        if weak(wall) {
            columns.extend(wall.take_columns());
            false
        } else {
            true
        }
    });
    for pool in pools.iter_mut() {
        while !pool.cases.is_empty() {
            columns.push(take_column(pool, envelope.height));
        }
    }
    info!(
        target: "solve.consolidate",
        columns = columns.len(),
        "column_rebuild_started"
    );

    // Widest first; stable, so equal widths keep decomposition order.
    columns.sort_by(|a, b| {
        b.width
            .partial_cmp(&a.width)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    while !columns.is_empty() {
        let anchor = columns.remove(0);
        let mut wall = Wall::new(Reliability::OrphanSameDept);
        wall.push_column(anchor);
        loop {
            let Some(pick) = best_fit(&wall, &columns, envelope, tuning) else {
                break;
            };
            wall.push_column(columns.remove(pick));
        }
        let single_group = wall.groups.len() == 1;
        let mut depts: Vec<&str> = Vec::new();
        for column in &wall.columns {
            if !depts.contains(&column.dept.as_str()) {
                depts.push(column.dept.as_str());
            }
        }
        wall.reliability = if single_group || depts.len() == 1 {
            Reliability::OrphanSameDept
        } else {
            Reliability::OrphanMixed
        };
        debug!(
            target: "solve.consolidate",
            groups = %wall.groups.join("+"),
            fill = wall.fill_ratio(width),
            "wall_rebuilt"
        );
        diag.record_wall_rebuilt();
        walls.push(wall);
    }
}

/// Weighted best-fit selection: fill dominates, then depth homogeneity,
/// then height evenness, then a small same-department bonus. Returns the
/// index of the winning candidate, first-listed on a tie.
fn best_fit(
    wall: &Wall,
    columns: &[Column],
    envelope: &TruckEnvelope,
    tuning: &Tuning,
) -> Option<usize> {
    let width = envelope.width;
    let wall_dept = wall.majority_dept().to_string();
    let mut best: Option<(usize, f64)> = None;
    for (index, column) in columns.iter().enumerate() {
        if !wall.accepts(column.width, column.depth, width, tuning.depth_relaxed) {
            continue;
        }
        let new_fill = (wall.width_fill + column.width) / width;
        let depth_delta = (column.depth - wall.depth).abs();
        let height_term = if envelope.height > 0.0 {
            1.0 - (wall.max_height - column.stacked_height()).abs() / envelope.height
        } else {
            1.0
        };
        let same_dept = if column.dept == wall_dept { 1.0 } else { 0.0 };
        let score = 0.60 * new_fill
            + 0.25 * (1.0 - depth_delta / tuning.depth_relaxed)
            + 0.10 * height_term
            + 0.05 * same_dept;
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}
