//! Inventory staging: ingestion, group splitting, and packing geometry.
//!
//! This crate covers the front of the pipeline. `ingest` screens raw
//! specs (skipping unusable ones with a diagnostic), `split_groups`
//! establishes the foundational invariant that every inventory group is
//! dimensionally uniform, and `resolve_group_rotation` runs the packing
//! oracle so each non-floor group enters wall construction in its
//! width-densest orientation.
//!
//! Every traversal here is insertion-ordered; the split buckets and the
//! produced group listing are part of the deterministic output contract.

use core_model::{
    Case, CaseId, CaseSpec, DiagEvent, Diagnostics, InsertionBuckets, InventoryGroup, TruckEnvelope,
    split_group_name,
};
use tracing::{debug, info};

pub mod rotate;

pub use rotate::{depth_compat_orientation, packing_orientation};

/// Screen raw specs into owned cases. Cases with a non-positive dimension
/// are skipped with a diagnostic and never reach the solver.
pub fn ingest(specs: &[CaseSpec], diag: &mut Diagnostics) -> Vec<Case> {
    let mut cases = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        let case = Case::from_spec(CaseId(index), spec);
        if !case.dims.is_valid() {
            debug!(
                target: "solve.split",
                name = %case.name,
                width = case.dims.width,
                depth = case.dims.depth,
                height = case.dims.height,
                "case_rejected"
            );
            diag.push(DiagEvent::InvalidCase {
                name: case.name.clone(),
                reason: "non-positive dimension".to_string(),
            });
            continue;
        }
        cases.push(case);
    }
    cases
}

/// Phase 0: bucket cases by group tag, then split any tag whose members
/// disagree on dimensions or stacking policy into one uniform group per
/// bucket. Mixed tags get synthetic suffixed names; uniform tags keep
/// their original name.
pub fn split_groups(cases: Vec<Case>, diag: &mut Diagnostics) -> Vec<InventoryGroup> {
    let mut by_tag: InsertionBuckets<String, Case> = InsertionBuckets::new();
    for case in cases {
        by_tag.push(case.group.clone(), case);
    }

    let mut groups = Vec::new();
    for (tag, members) in by_tag.into_entries() {
        // Bucket by (dims, stacking policy, floor flag); any disagreement
        // splits the tag.
        let mut buckets: Vec<(SplitKey, Vec<Case>)> = Vec::new();
        for case in members {
            let key = SplitKey::of(&case);
            match buckets.iter_mut().find(|(k, _)| *k == key) {
                Some((_, bucket)) => bucket.push(case),
                None => buckets.push((key, vec![case])),
            }
        }
        let mixed = buckets.len() > 1;
        if mixed {
            info!(
                target: "solve.split",
                tag = %tag,
                variants = buckets.len(),
                "group_split"
            );
            diag.note(format!(
                "split group \"{}\" into {} dimension variants",
                tag,
                buckets.len()
            ));
        }
        for (key, bucket) in buckets {
            let first = &bucket[0];
            let name = if mixed {
                split_group_name(&tag, &first.dims)
            } else {
                tag.clone()
            };
            groups.push(InventoryGroup {
                name,
                dims: first.dims,
                rotation: first.rotation,
                dept: first.dept.clone(),
                stackable: key.stackable,
                max_stack: key.max_stack,
                is_floor: key.is_floor,
                cases: bucket,
            });
        }
    }
    groups
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SplitKey {
    width: f64,
    depth: f64,
    height: f64,
    stackable: bool,
    max_stack: u32,
    is_floor: bool,
}

impl SplitKey {
    fn of(case: &Case) -> Self {
        Self {
            width: case.dims.width,
            depth: case.dims.depth,
            height: case.dims.height,
            stackable: case.stackable,
            max_stack: case.max_stack,
            is_floor: case.is_floor,
        }
    }
}

/// Phase 1: run the packing oracle over every non-floor group. Floor
/// panels are laid as ingested; their per-row geometry is computed by the
/// floor phase directly.
pub fn resolve_group_rotation(groups: &mut [InventoryGroup], envelope: &TruckEnvelope) {
    for group in groups.iter_mut().filter(|g| !g.is_floor) {
        let allow = group.cases.iter().all(|c| c.allow_rotation);
        let (dims, turned) = packing_orientation(group.dims, allow, envelope.width);
        if turned {
            debug!(
                target: "solve.split",
                group = %group.name,
                width = dims.width,
                depth = dims.depth,
                "group_rotated_for_fill"
            );
            group.dims = dims;
            group.rotation = group.rotation.compose(core_model::Rotation::R90);
        }
    }
}

/// Items per row for a group at the current orientation. Zero-width
/// groups cannot exist past ingestion.
pub fn per_row(width: f64, truck_width: f64) -> u32 {
    if width <= 0.0 {
        return 0;
    }
    (truck_width / width).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::Dims;

    fn spec(name: &str, group: Option<&str>, w: f64, d: f64, h: f64) -> CaseSpec {
        CaseSpec {
            name: name.to_string(),
            width: w,
            depth: d,
            height: h,
            dept: "GENERAL".to_string(),
            group: group.map(|g| g.to_string()),
            stackable: false,
            max_stack: 1,
            is_floor: false,
            allow_rotation: true,
            rotation: 0,
        }
    }

    #[test]
    fn ingest_skips_degenerate_cases() {
        let specs = [
            spec("ok", None, 30.0, 30.0, 40.0),
            spec("flat", None, 30.0, 0.0, 40.0),
        ];
        let mut diag = Diagnostics::new();
        let cases = ingest(&specs, &mut diag);
        assert_eq!(cases.len(), 1);
        assert_eq!(diag.counters().cases_skipped, 1);
    }

    #[test]
    fn uniform_tag_keeps_its_name() {
        let specs = [
            spec("a1", Some("Alpha"), 31.0, 29.0, 36.0),
            spec("a2", Some("Alpha"), 31.0, 29.0, 36.0),
        ];
        let mut diag = Diagnostics::new();
        let groups = split_groups(ingest(&specs, &mut diag), &mut diag);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Alpha");
        assert_eq!(groups[0].case_count(), 2);
    }

    #[test]
    fn mixed_tag_splits_with_suffixed_names() {
        let specs = [
            spec("a1", Some("Alpha"), 31.0, 29.0, 36.0),
            spec("a2", Some("Alpha"), 24.0, 24.0, 30.0),
            spec("a3", Some("Alpha"), 31.0, 29.0, 36.0),
        ];
        let mut diag = Diagnostics::new();
        let groups = split_groups(ingest(&specs, &mut diag), &mut diag);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Alpha (31x29x36)");
        assert_eq!(groups[0].case_count(), 2);
        assert_eq!(groups[1].name, "Alpha (24x24x30)");
        // All members of a split bucket share dimensions.
        assert!(groups[0].cases.iter().all(|c| c.dims == groups[0].dims));
    }

    #[test]
    fn stack_policy_disagreement_also_splits() {
        let mut a = spec("a1", Some("Alpha"), 31.0, 29.0, 36.0);
        a.stackable = true;
        a.max_stack = 2;
        let b = spec("a2", Some("Alpha"), 31.0, 29.0, 36.0);
        let mut diag = Diagnostics::new();
        let groups = split_groups(ingest(&[a, b], &mut diag), &mut diag);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn rotation_resolved_toward_better_fill() {
        // 50x20 in a 98" hold: upright fits 1 per row (50), rotated fits
        // 4 per row (80).
        let specs = [spec("r", Some("Riser"), 50.0, 20.0, 12.0)];
        let mut diag = Diagnostics::new();
        let mut groups = split_groups(ingest(&specs, &mut diag), &mut diag);
        resolve_group_rotation(&mut groups, &TruckEnvelope::new(98.0, 240.0, 110.0));
        assert_eq!(groups[0].dims, Dims::new(20.0, 50.0, 12.0));
        assert_eq!(groups[0].rotation, core_model::Rotation::R90);
    }

    #[test]
    fn floor_groups_are_never_rotated() {
        let mut s = spec("panel", Some("Deck"), 45.0, 100.0, 60.0);
        s.is_floor = true;
        let mut diag = Diagnostics::new();
        let mut groups = split_groups(ingest(&[s], &mut diag), &mut diag);
        resolve_group_rotation(&mut groups, &TruckEnvelope::new(98.0, 240.0, 110.0));
        assert_eq!(groups[0].dims, Dims::new(45.0, 100.0, 60.0));
    }

    #[test]
    fn per_row_floors_the_quotient() {
        assert_eq!(per_row(30.0, 98.0), 3);
        assert_eq!(per_row(49.0, 98.0), 2);
        assert_eq!(per_row(110.0, 98.0), 0);
    }
}
