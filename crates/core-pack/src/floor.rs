//! Floor-panel emission.
//!
//! Floor panels are substrate: full-width walls laid before anything
//! else, separated by load-bar spacers so the bars can drop into the
//! gap between rows. Floor walls bypass every later optimization phase
//! and are placed first at y = 0.

use core_config::Tuning;
use core_model::{
    Diagnostics, FloorItem, InventoryGroup, LoadBarSpacer, Reliability, TruckEnvelope, Wall,
};
use crate::take_column;
use tracing::info;

/// Phase 1.5: consume every floor group into full-width walls with a
/// spacer between consecutive walls, never after the last.
pub fn emit_floor_walls(
    floor_groups: Vec<InventoryGroup>,
    envelope: &TruckEnvelope,
    tuning: &Tuning,
    diag: &mut Diagnostics,
) -> Vec<FloorItem> {
    let mut floor_walls: Vec<Wall> = Vec::new();
    for mut group in floor_groups {
        let per_row = core_inventory::per_row(group.dims.width, envelope.width).max(1);
        while !group.cases.is_empty() {
            let mut wall = Wall::new(Reliability::FullWall);
            wall.flat_top = true;
            wall.is_floor = true;
            for _ in 0..per_row {
                if group.cases.is_empty() {
                    break;
                }
                wall.push_column(take_column(&mut group, envelope.height));
            }
            diag.record_wall_built();
            floor_walls.push(wall);
        }
    }
    if !floor_walls.is_empty() {
        info!(
            target: "solve.floor",
            walls = floor_walls.len(),
            spacer = tuning.loadbar_gap,
            "floor_walls_emitted"
        );
        diag.note(format!(
            "floor: {} panel wall(s) with {}\" load-bar spacing",
            floor_walls.len(),
            tuning.loadbar_gap
        ));
    }

    let mut items = Vec::new();
    let total = floor_walls.len();
    for (index, wall) in floor_walls.into_iter().enumerate() {
        items.push(FloorItem::Wall(wall));
        if index + 1 < total {
            items.push(FloorItem::Spacer(LoadBarSpacer::new(tuning.loadbar_gap)));
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::group;

    fn floor_group(name: &str, w: f64, d: f64, h: f64, count: usize) -> InventoryGroup {
        let mut g = group(name, "CARP", w, d, h, count);
        g.is_floor = true;
        for c in &mut g.cases {
            c.is_floor = true;
        }
        g
    }

    #[test]
    fn panels_fill_rows_with_spacers_between() {
        let env = TruckEnvelope::new(98.0, 240.0, 96.0);
        let mut diag = Diagnostics::new();
        // 45" panels: two per row, four panels -> two walls, one spacer.
        let items = emit_floor_walls(
            vec![floor_group("Deck", 45.0, 100.0, 60.0, 4)],
            &env,
            &Tuning::default(),
            &mut diag,
        );
        assert_eq!(items.len(), 3);
        match (&items[0], &items[1], &items[2]) {
            (FloorItem::Wall(a), FloorItem::Spacer(s), FloorItem::Wall(b)) => {
                assert_eq!(a.columns.len(), 2);
                assert_eq!(a.width_fill, 90.0);
                assert!(a.flat_top && a.is_floor);
                assert_eq!(a.reliability, Reliability::FullWall);
                assert_eq!(s.depth, 2.0);
                assert_eq!(b.columns.len(), 2);
            }
            other => panic!("unexpected floor layout: {other:?}"),
        }
    }

    #[test]
    fn single_wall_gets_no_spacer() {
        let env = TruckEnvelope::new(98.0, 240.0, 96.0);
        let mut diag = Diagnostics::new();
        let items = emit_floor_walls(
            vec![floor_group("Deck", 45.0, 100.0, 60.0, 2)],
            &env,
            &Tuning::default(),
            &mut diag,
        );
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], FloorItem::Wall(_)));
    }

    #[test]
    fn oversize_panel_still_lays_alone() {
        let env = TruckEnvelope::new(98.0, 240.0, 96.0);
        let mut diag = Diagnostics::new();
        let items = emit_floor_walls(
            vec![floor_group("Wide", 120.0, 100.0, 60.0, 1)],
            &env,
            &Tuning::default(),
            &mut diag,
        );
        assert_eq!(items.len(), 1);
    }
}
