//! Phase 3B: rotation-aware, depth-grouped first-fit-decreasing over the
//! orphan pools, followed by weak-wall merging.
//!
//! Operating principle: walls must be depth-homogeneous before they can
//! be width-dense. The oracle therefore re-runs in depth-compatibility
//! mode first, then pools are clustered by depth against a listing-order
//! seed: strictly (within 2") per department, then relaxed (within 8")
//! across departments for anything the strict pass left behind. Each
//! cluster is packed widest-first.
//!
//! The walls coming out of the passes are frequently underfilled; the
//! merge step accretes them pairwise, same department first so that a
//! departmentally coherent load keeps its ORPHAN_SAME_DEPT tier, then
//! across departments at the cost of an ORPHAN_MIXED demotion.

use crate::take_column;
use core_config::Tuning;
use core_inventory::depth_compat_orientation;
use core_model::{
    DiagEvent, Diagnostics, EPS, InsertionBuckets, InventoryGroup, Reliability, TruckEnvelope,
    Wall,
};
use tracing::{debug, info};

/// Phase 3B entry: re-orient pools for depth compatibility, run both
/// clustering passes, and return the rescue walls in construction order.
pub fn rescue_orphans(
    pools: &mut [InventoryGroup],
    envelope: &TruckEnvelope,
    tuning: &Tuning,
    diag: &mut Diagnostics,
) -> Vec<Wall> {
    reorient_for_depth(pools, envelope, tuning);

    let mut walls = Vec::new();

    // Pass 1: strict clustering inside each department.
    let mut by_dept: InsertionBuckets<String, usize> = InsertionBuckets::new();
    for (index, pool) in pools.iter().enumerate() {
        if !pool.cases.is_empty() {
            by_dept.push(pool.dept.clone(), index);
        }
    }
    for (_dept, indices) in by_dept.into_entries() {
        build_clustered_walls(
            &indices,
            pools,
            envelope,
            tuning,
            tuning.depth_strict,
            Reliability::OrphanSameDept,
            diag,
            &mut walls,
        );
    }

    // Pass 2: relaxed clustering across all departments for any pool the
    // strict pass left with cases.
    let remainder: Vec<usize> = pools
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.cases.is_empty())
        .map(|(i, _)| i)
        .collect();
    if !remainder.is_empty() {
        build_clustered_walls(
            &remainder,
            pools,
            envelope,
            tuning,
            tuning.depth_relaxed,
            Reliability::OrphanMixed,
            diag,
            &mut walls,
        );
    }

    info!(
        target: "solve.ffd",
        walls = walls.len(),
        "orphan_rescue_done"
    );
    walls
}

/// Re-run the rotation oracle over every pool with the depth-compat
/// objective. Each pool is evaluated against the current orientation of
/// the others, in listing order.
fn reorient_for_depth(pools: &mut [InventoryGroup], envelope: &TruckEnvelope, tuning: &Tuning) {
    for index in 0..pools.len() {
        if pools[index].cases.is_empty() {
            continue;
        }
        let allow = pools[index].cases.iter().all(|c| c.allow_rotation);
        let others: Vec<&InventoryGroup> = pools
            .iter()
            .enumerate()
            .filter(|(j, p)| *j != index && !p.cases.is_empty())
            .map(|(_, p)| p)
            .collect();
        let (dims, turned) = depth_compat_orientation(
            pools[index].dims,
            allow,
            envelope.width,
            tuning.depth_relaxed,
            &others,
        );
        drop(others);
        if turned {
            debug!(
                target: "solve.ffd",
                pool = %pools[index].name,
                depth = dims.depth,
                "pool_reoriented_for_depth"
            );
            pools[index].dims = dims;
            pools[index].rotation = pools[index].rotation.compose(core_model::Rotation::R90);
        }
    }
}

/// Cluster the given pools by depth against a listing-order seed, then
/// greedily pack each cluster widest-first. Every wall built is kept; the
/// merge and consolidation steps own what ends up weak.
#[allow(clippy::too_many_arguments)]
fn build_clustered_walls(
    indices: &[usize],
    pools: &mut [InventoryGroup],
    envelope: &TruckEnvelope,
    tuning: &Tuning,
    depth_tol: f64,
    reliability: Reliability,
    diag: &mut Diagnostics,
    walls: &mut Vec<Wall>,
) {
    let mut unclustered: Vec<usize> = indices.to_vec();
    while let Some(&seed) = unclustered.first() {
        let seed_depth = pools[seed].dims.depth;
        let cluster: Vec<usize> = unclustered
            .iter()
            .copied()
            .filter(|&i| (pools[i].dims.depth - seed_depth).abs() <= depth_tol)
            .collect();
        unclustered.retain(|i| !cluster.contains(i));

        // Widest pools first; stable, so equal widths keep listing order.
        let mut order = cluster.clone();
        order.sort_by(|&a, &b| {
            pools[b]
                .dims
                .width
                .partial_cmp(&pools[a].dims.width)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        loop {
            let mut wall = Wall::new(reliability);
            for &pi in &order {
                while !pools[pi].cases.is_empty() {
                    let (w, d) = (pools[pi].dims.width, pools[pi].dims.depth);
                    // Clustering bounds member depths against the seed;
                    // the wall itself only has to keep a strappable face.
                    // The first column is accepted unconditionally so an
                    // oversize orphan still travels in a wall.
                    if !wall.is_empty()
                        && !wall.accepts(w, d, envelope.width, tuning.depth_relaxed)
                    {
                        break;
                    }
                    wall.push_column(take_column(&mut pools[pi], envelope.height));
                }
            }
            if wall.is_empty() {
                break;
            }
            debug!(
                target: "solve.ffd",
                groups = %wall.groups.join("+"),
                fill = wall.fill_ratio(envelope.width),
                tier = wall.reliability.tier(),
                "rescue_wall_built"
            );
            diag.record_wall_built();
            walls.push(wall);
        }
    }
}

/// Post-3B accretion of weak walls: intra-department first, then
/// cross-department. Two walls merge when both are below the minimum
/// fill, their combined width fits, and the combined depth spread stays
/// inside the flat-face band.
pub fn merge_weak_walls(
    walls: &mut Vec<Wall>,
    envelope: &TruckEnvelope,
    tuning: &Tuning,
    diag: &mut Diagnostics,
) {
    for same_dept_pass in [true, false] {
        let mut i = 0;
        while i < walls.len() {
            if walls[i].fill_ratio(envelope.width) >= tuning.min_fill {
                i += 1;
                continue;
            }
            let mut j = i + 1;
            while j < walls.len() {
                if can_merge(&walls[i], &walls[j], envelope, tuning, same_dept_pass) {
                    let donor = walls.remove(j);
                    diag.push(DiagEvent::Merge {
                        absorbed: donor.groups.join("+"),
                        into: walls[i].groups.join("+"),
                    });
                    debug!(
                        target: "solve.ffd",
                        absorbed = %donor.groups.join("+"),
                        into = %walls[i].groups.join("+"),
                        cross_dept = !same_dept_pass,
                        "weak_walls_merged"
                    );
                    let merged_rel = walls[i].reliability.demote(donor.reliability);
                    for column in donor.columns {
                        walls[i].push_column(column);
                    }
                    walls[i].reliability = merged_rel;
                    if !same_dept_pass {
                        walls[i].demote(Reliability::OrphanMixed);
                    }
                    // Re-scan from the same j: the absorber changed.
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
    }
}

fn can_merge(
    a: &Wall,
    b: &Wall,
    envelope: &TruckEnvelope,
    tuning: &Tuning,
    same_dept: bool,
) -> bool {
    if b.fill_ratio(envelope.width) >= tuning.min_fill {
        return false;
    }
    if same_dept && a.majority_dept() != b.majority_dept() {
        return false;
    }
    if (a.depth - b.depth).abs() > tuning.depth_relaxed {
        return false;
    }
    if a.width_fill + b.width_fill > envelope.width + EPS {
        return false;
    }
    // The merged wall must still present a strappable face.
    let hi = a.depth.max(b.depth);
    let lo = a.min_depth.min(b.min_depth);
    hi - lo <= tuning.depth_relaxed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::group;

    const ENV: TruckEnvelope = TruckEnvelope {
        width: 98.0,
        length: 240.0,
        height: 96.0,
    };

    #[test]
    fn strict_pass_builds_same_dept_walls() {
        let mut diag = Diagnostics::new();
        // Two depth-compatible LX pools that together fill a wall:
        // 2x30 + 2x18 = 96/98.
        let mut pools = vec![
            group("A", "LX", 30.0, 24.0, 40.0, 2),
            group("B", "LX", 18.0, 25.0, 36.0, 2),
        ];
        let walls = rescue_orphans(&mut pools, &ENV, &Tuning::default(), &mut diag);
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].reliability, Reliability::OrphanSameDept);
        assert_eq!(walls[0].columns.len(), 4);
        // Widest-first packing puts the 30" columns on the left.
        assert_eq!(walls[0].columns[0].width, 30.0);
        assert!(pools.iter().all(|p| p.cases.is_empty()));
    }

    #[test]
    fn depth_incompatible_pools_rejoin_through_the_merge() {
        let mut diag = Diagnostics::new();
        // Depths 20 vs 26: outside the +-2 strict band so the strict pass
        // builds two weak walls; the intra-department merge unites them
        // without losing the same-department tier.
        let mut pools = vec![
            group("A", "LX", 30.0, 20.0, 40.0, 2),
            group("B", "LX", 30.0, 26.0, 40.0, 1),
        ];
        let mut walls = rescue_orphans(&mut pools, &ENV, &Tuning::default(), &mut diag);
        assert_eq!(walls.len(), 2);
        merge_weak_walls(&mut walls, &ENV, &Tuning::default(), &mut diag);
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].columns.len(), 3);
        assert_eq!(walls[0].reliability, Reliability::OrphanSameDept);
    }

    #[test]
    fn cross_dept_rescue_is_mixed_reliability() {
        let mut diag = Diagnostics::new();
        let mut pools = vec![
            group("A", "LX", 30.0, 24.0, 40.0, 2),
            group("B", "SON", 30.0, 24.0, 40.0, 1),
        ];
        let mut walls = rescue_orphans(&mut pools, &ENV, &Tuning::default(), &mut diag);
        // One weak wall per department out of the strict pass.
        assert_eq!(walls.len(), 2);
        merge_weak_walls(&mut walls, &ENV, &Tuning::default(), &mut diag);
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].reliability, Reliability::OrphanMixed);
        assert_eq!(walls[0].case_count(), 3);
    }

    #[test]
    fn merge_combines_weak_depth_compatible_walls() {
        let mut diag = Diagnostics::new();
        let mut walls = Vec::new();
        for (name, d) in [("A", 20.0), ("B", 24.0)] {
            let mut g = group(name, "LX", 40.0, d, 40.0, 1);
            let mut wall = Wall::new(Reliability::OrphanSameDept);
            wall.push_column(take_column(&mut g, ENV.height));
            walls.push(wall);
        }
        merge_weak_walls(&mut walls, &ENV, &Tuning::default(), &mut diag);
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].columns.len(), 2);
        // Appended columns sit to the right of the absorber's fill.
        assert_eq!(walls[0].columns[1].x_off, 40.0);
        assert_eq!(diag.counters().walls_merged, 1);
    }

    #[test]
    fn merge_refuses_overwidth_or_deep_mismatch() {
        let mut diag = Diagnostics::new();
        let mut walls = Vec::new();
        for (name, d, w) in [("A", 20.0, 30.0), ("B", 40.0, 30.0), ("C", 20.0, 45.0)] {
            let mut g = group(name, "LX", w, d, 40.0, 2);
            let mut wall = Wall::new(Reliability::OrphanSameDept);
            wall.push_column(take_column(&mut g, ENV.height));
            wall.push_column(take_column(&mut g, ENV.height));
            walls.push(wall);
        }
        // A(60", d20) + B: depth gap 20 > 8. A + C(90"): 150 > 98.5.
        merge_weak_walls(&mut walls, &ENV, &Tuning::default(), &mut diag);
        assert_eq!(walls.len(), 3);
    }

    #[test]
    fn oracle_reorients_pools_toward_shared_depth() {
        let mut diag = Diagnostics::new();
        // The 50x20 pool turns so its depth joins the 48-deep crowd.
        let mut pools = vec![
            group("Risers", "CARP", 50.0, 20.0, 12.0, 2),
            group("Flats", "CARP", 30.0, 48.0, 60.0, 4),
        ];
        let _ = rescue_orphans(&mut pools, &ENV, &Tuning::default(), &mut diag);
        assert_eq!(pools[0].dims.depth, 50.0);
        assert_eq!(pools[0].rotation, core_model::Rotation::R90);
    }
}
