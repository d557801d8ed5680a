//! Wall construction phases.
//!
//! Everything between inventory staging and wall ordering lives here:
//! floor-panel emission, single-group full walls, gap filling, the
//! reserved knowledge-base hook, the two-pass orphan rescue, and the two
//! consolidation passes. Each phase is a pure transformation over the
//! wall pool; no phase is re-entered.

use core_model::{Column, InventoryGroup};

pub mod consolidate;
pub mod ffd;
pub mod floor;
pub mod kb;
pub mod walls;

pub use consolidate::{absorb_weak_walls, rebuild_weak_walls};
pub use ffd::{merge_weak_walls, rescue_orphans};
pub use floor::emit_floor_walls;
pub use kb::apply_kb_patterns;
pub use walls::{build_full_walls, gap_fill};

/// Detach one column from the front of a pool: as many cases as the
/// stacking policy and the roof allow. The pool keeps its remaining
/// members.
///
/// Callers guarantee the pool is non-empty.
pub fn take_column(pool: &mut InventoryGroup, truck_height: f64) -> Column {
    let k = pool
        .stack_limit(truck_height)
        .min(pool.cases.len() as u32)
        .max(1);
    let cases: Vec<_> = pool.cases.drain(..k as usize).collect();
    Column {
        group: pool.name.clone(),
        dept: pool.dept.clone(),
        width: pool.dims.width,
        depth: pool.dims.depth,
        height: pool.dims.height,
        count: k,
        rotation: pool.rotation,
        cases,
        x_off: 0.0,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use testutil::{group, stackable};

    #[test]
    fn take_column_honors_stack_policy_and_roof() {
        let mut g = stackable(group("G", "LX", 30.0, 30.0, 40.0, 5), 4);
        // Roof at 110 limits the stack to two 40" units.
        let col = take_column(&mut g, 110.0);
        assert_eq!(col.count, 2);
        assert_eq!(col.cases.len(), 2);
        assert_eq!(col.stacked_height(), 80.0);
        assert_eq!(g.case_count(), 3);
    }

    #[test]
    fn take_column_unstackable_takes_one() {
        let mut g = group("G", "LX", 30.0, 30.0, 40.0, 3);
        let col = take_column(&mut g, 110.0);
        assert_eq!(col.count, 1);
        assert_eq!(g.case_count(), 2);
    }
}
