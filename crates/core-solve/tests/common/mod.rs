//! Shared builders for the solver integration tests.
#![allow(dead_code)] // each test binary uses its own subset

use core_model::{CaseSpec, TruckEnvelope};

pub const TRUCK: TruckEnvelope = TruckEnvelope {
    width: 98.0,
    length: 240.0,
    height: 96.0,
};

pub fn case(name: &str, w: f64, d: f64, h: f64) -> CaseSpec {
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

pub fn grouped(name: &str, group: &str, w: f64, d: f64, h: f64) -> CaseSpec {
    CaseSpec {
        group: Some(group.to_string()),
        ..case(name, w, d, h)
    }
}

pub fn in_dept(mut spec: CaseSpec, dept: &str) -> CaseSpec {
    spec.dept = dept.to_string();
    spec
}

pub fn stackable(mut spec: CaseSpec, max_stack: u32) -> CaseSpec {
    spec.stackable = true;
    spec.max_stack = max_stack;
    spec
}

pub fn floor_panel(mut spec: CaseSpec) -> CaseSpec {
    spec.is_floor = true;
    spec
}

pub fn no_rotation(mut spec: CaseSpec) -> CaseSpec {
    spec.allow_rotation = false;
    spec
}

/// N copies of a spec with numbered names, sharing the group tag.
pub fn batch(spec: &CaseSpec, count: usize) -> Vec<CaseSpec> {
    (0..count)
        .map(|i| {
            let mut c = spec.clone();
            c.name = format!("{} #{i}", spec.name);
            c.group = Some(
                spec.group
                    .clone()
                    .unwrap_or_else(|| spec.name.clone()),
            );
            c
        })
        .collect()
}
