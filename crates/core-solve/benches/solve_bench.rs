//! Full-pipeline benchmark over a representative tour inventory.

use core_model::{CaseSpec, TruckEnvelope};
use core_solve::{SolveOptions, solve};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn tour_inventory() -> Vec<CaseSpec> {
    let mut specs = Vec::new();
    let groups: &[(&str, &str, f64, f64, f64, bool, u32, usize)] = &[
        ("Amp", "SON", 30.0, 30.0, 44.0, false, 1, 24),
        ("Dimmer", "LX", 26.0, 28.0, 24.0, true, 3, 36),
        ("Cable Trunk", "LX", 24.0, 24.0, 30.0, true, 2, 40),
        ("Wardrobe", "COST", 40.0, 24.0, 66.0, false, 1, 12),
        ("Prop Crate", "PROPS", 50.0, 20.0, 18.0, true, 2, 30),
        ("Riser", "CARP", 49.0, 25.0, 12.0, true, 4, 28),
        ("Video Rack", "VDO", 32.0, 26.0, 50.0, false, 1, 18),
        ("Office", "ADM", 22.0, 18.0, 20.0, true, 2, 12),
    ];
    for (name, dept, w, d, h, stackable, max_stack, count) in groups {
        for i in 0..*count {
            specs.push(CaseSpec {
                name: format!("{name} #{i}"),
                width: *w,
                depth: *d,
                height: *h,
                dept: dept.to_string(),
                group: Some(name.to_string()),
                stackable: *stackable,
                max_stack: *max_stack,
                is_floor: false,
                allow_rotation: true,
                rotation: 0,
            });
        }
    }
    for i in 0..4 {
        specs.push(CaseSpec {
            name: format!("Deck #{i}"),
            width: 45.0,
            depth: 96.0,
            height: 58.0,
            dept: "CARP".to_string(),
            group: Some("Deck".to_string()),
            stackable: false,
            max_stack: 1,
            is_floor: true,
            allow_rotation: false,
            rotation: 0,
        });
    }
    specs
}

fn bench_solve(c: &mut Criterion) {
    let specs = tour_inventory();
    let envelope = TruckEnvelope::new(98.0, 636.0, 110.0);
    let options = SolveOptions::default();
    c.bench_function("solve_200_case_tour", |b| {
        b.iter(|| solve(black_box(&specs), envelope, &options).unwrap())
    });
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
