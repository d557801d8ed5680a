//! The rotation oracle.
//!
//! The same question (should this footprint be yawed a quarter turn?)
//! is asked twice with different objectives. At inventory time the
//! objective is packing fit: pick the orientation that fills more of the
//! row. At orphan-rescue time the objective flips to depth
//! compatibility: pick the orientation whose depth sits within the
//! relaxed band of the most other orphan cases, so walls can be
//! depth-homogeneous before they are width-dense.
//!
//! Both objectives short-circuit when rotation is disallowed or the
//! footprint is near square.

use core_model::{Dims, InventoryGroup};

/// Items per row at a given piece width; zero when the piece is wider
/// than the hold.
fn items_per_row(width: f64, truck_width: f64) -> u32 {
    if width <= 0.0 {
        return 0;
    }
    (truck_width / width).floor() as u32
}

/// Packing-fit objective. Returns the chosen dims and whether they were
/// rotated relative to the input.
///
/// The orientation with the strictly larger per-row fill wins; a fill tie
/// breaks toward the larger per-row count; a full tie keeps the input
/// orientation.
pub fn packing_orientation(dims: Dims, allow_rotation: bool, truck_width: f64) -> (Dims, bool) {
    if !allow_rotation || dims.near_square() {
        return (dims, false);
    }
    let upright = items_per_row(dims.width, truck_width);
    let turned = items_per_row(dims.depth, truck_width);
    let upright_fill = upright as f64 * dims.width;
    let turned_fill = turned as f64 * dims.depth;
    if turned_fill > upright_fill || (turned_fill == upright_fill && turned > upright) {
        (dims.rotated(), true)
    } else {
        (dims, false)
    }
}

/// Depth-compatibility objective used by the orphan rescue pass.
///
/// Each orientation scores 100 points per case in the *other* pools whose
/// current depth lies within `depth_tol` of the candidate depth, plus the
/// per-row fit count. A tie keeps the current orientation.
pub fn depth_compat_orientation(
    dims: Dims,
    allow_rotation: bool,
    truck_width: f64,
    depth_tol: f64,
    others: &[&InventoryGroup],
) -> (Dims, bool) {
    if !allow_rotation || dims.near_square() {
        return (dims, false);
    }
    let score = |candidate: &Dims| -> u64 {
        let compatible: u64 = others
            .iter()
            .filter(|pool| (pool.dims.depth - candidate.depth).abs() <= depth_tol)
            .map(|pool| pool.case_count() as u64)
            .sum();
        compatible * 100 + items_per_row(candidate.width, truck_width) as u64
    };
    let turned = dims.rotated();
    if score(&turned) > score(&dims) {
        (turned, true)
    } else {
        (dims, false)
    }
}
