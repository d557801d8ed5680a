//! Phase 2 full-wall construction and Phase 2.5 gap fill.
//!
//! Full walls are single-group grids built greedily left to right. A
//! wall that ends below the minimum fill dissolves back into an orphan
//! pool for its group; the rescue phases own those from here on. Gap
//! fill then tops up underfilled full walls with same-department,
//! depth-compatible orphans at the cost of a reliability demotion.

use crate::take_column;
use core_config::Tuning;
use core_model::{Diagnostics, InventoryGroup, Reliability, TruckEnvelope, Wall};
use tracing::{debug, info};

/// Phase 2: build single-group walls for every non-floor group. Returns
/// the kept walls plus the orphan pools (groups with undissolved
/// leftovers).
pub fn build_full_walls(
    groups: Vec<InventoryGroup>,
    envelope: &TruckEnvelope,
    tuning: &Tuning,
    diag: &mut Diagnostics,
) -> (Vec<Wall>, Vec<InventoryGroup>) {
    let mut walls = Vec::new();
    let mut pools = Vec::new();

    for mut group in groups {
        loop {
            if group.cases.is_empty() {
                break;
            }
            let mut wall = Wall::new(Reliability::FullWall);
            while !group.cases.is_empty() {
                let width = group.dims.width;
                // The first column is accepted unconditionally so an
                // oversize case still travels in a wall and can spill at
                // emission instead of looping here forever.
                if !wall.is_empty() && wall.width_fill + width > envelope.width {
                    break;
                }
                wall.push_column(take_column(&mut group, envelope.height));
            }
            if wall.fill_ratio(envelope.width) >= tuning.min_fill {
                debug!(
                    target: "solve.walls",
                    group = %group.name,
                    columns = wall.columns.len(),
                    fill = wall.fill_ratio(envelope.width),
                    "full_wall_built"
                );
                diag.record_wall_built();
                walls.push(wall);
            } else {
                // Dissolve: wall members rejoin the remaining cases in
                // their original order, and the group becomes a pool.
                let mut restored = Vec::new();
                for column in wall.take_columns() {
                    restored.extend(column.cases);
                }
                restored.append(&mut group.cases);
                group.cases = restored;
                break;
            }
        }
        if !group.cases.is_empty() {
            debug!(
                target: "solve.walls",
                group = %group.name,
                orphans = group.case_count(),
                "orphan_pool_opened"
            );
            pools.push(group);
        }
    }

    info!(
        target: "solve.walls",
        walls = walls.len(),
        pools = pools.len(),
        "full_wall_phase_done"
    );
    (walls, pools)
}

/// Phase 2.5: top up full walls below the gap threshold with columns from
/// same-department, depth-compatible pools. Any acceptance demotes the
/// wall to a tight fit.
pub fn gap_fill(
    walls: &mut [Wall],
    pools: &mut [InventoryGroup],
    envelope: &TruckEnvelope,
    tuning: &Tuning,
    diag: &mut Diagnostics,
) {
    for wall in walls.iter_mut() {
        if wall.reliability != Reliability::FullWall {
            continue;
        }
        if wall.fill_ratio(envelope.width) >= tuning.gap_thresh {
            continue;
        }
        let wall_dept = wall.majority_dept().to_string();
        let mut filled = false;
        for pool in pools.iter_mut() {
            if pool.cases.is_empty() || pool.dept != wall_dept {
                continue;
            }
            if (pool.dims.depth - wall.depth).abs() > tuning.depth_relaxed {
                continue;
            }
            let mut appended = 0usize;
            while !pool.cases.is_empty()
                && wall.accepts(
                    pool.dims.width,
                    pool.dims.depth,
                    envelope.width,
                    tuning.depth_relaxed,
                )
            {
                wall.push_column(take_column(pool, envelope.height));
                appended += 1;
            }
            if appended > 0 {
                filled = true;
                debug!(
                    target: "solve.gapfill",
                    pool = %pool.name,
                    columns = appended,
                    fill = wall.fill_ratio(envelope.width),
                    "gap_filled"
                );
            }
        }
        if filled {
            wall.demote(Reliability::TightFit);
            diag.note(format!(
                "gap fill: wall [{}] topped up, now {:.0}% full",
                wall.groups.join("+"),
                wall.fill_ratio(envelope.width) * 100.0
            ));
        }
    }
}
