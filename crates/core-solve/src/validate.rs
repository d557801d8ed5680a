//! Post-emission validation.
//!
//! Runs unconditionally after emission and reports, but never alters
//! placements: the solver does not validate during placement, so no
//! feedback loop can form. Findings surface as diagnostics for the
//! caller (an editor layer may repair them; that is out of scope here).

use core_config::Tuning;
use core_model::{DiagEvent, Diagnostics, EPS, Placement, TruckEnvelope, ViolationKind, WallSection};
use tracing::{info, warn};

pub fn validate_plan(
    placements: &[Placement],
    sections: &[WallSection],
    envelope: &TruckEnvelope,
    tuning: &Tuning,
    diag: &mut Diagnostics,
) {
    check_bounds(placements, envelope, diag);
    check_overlap(placements, diag);
    check_flat_face(sections, tuning, diag);
    info!(
        target: "solve.validate",
        violations = diag.counters().violations,
        "validation_done"
    );
}

fn check_bounds(placements: &[Placement], envelope: &TruckEnvelope, diag: &mut Diagnostics) {
    for p in placements {
        let mut problems: Vec<String> = Vec::new();
        if p.x < -EPS {
            problems.push(format!("x={:.1} < 0", p.x));
        }
        if p.x + p.width > envelope.width + EPS {
            problems.push(format!(
                "x+w={:.1} exceeds truck width {:.1}",
                p.x + p.width,
                envelope.width
            ));
        }
        if p.y < -EPS {
            problems.push(format!("y={:.1} < 0", p.y));
        }
        if p.z < -EPS {
            problems.push(format!("z={:.1} < 0", p.z));
        }
        if envelope.height > 0.0 && p.z + p.height > envelope.height + EPS {
            problems.push(format!(
                "z+h={:.1} exceeds truck height {:.1}",
                p.z + p.height,
                envelope.height
            ));
        }
        for problem in problems {
            warn!(target: "solve.validate", case = %p.name, %problem, "bounds_violation");
            diag.push(DiagEvent::Violation {
                kind: ViolationKind::Bounds,
                detail: format!("{}: {}", p.name, problem),
            });
        }
    }
}

/// Pairwise interval test on all three axes; an intrusion deeper than the
/// shared tolerance on every axis at once is a real collision.
fn check_overlap(placements: &[Placement], diag: &mut Diagnostics) {
    let intrudes = |a0: f64, a1: f64, b0: f64, b1: f64| a1.min(b1) - a0.max(b0) > EPS;
    for i in 0..placements.len() {
        for j in (i + 1)..placements.len() {
            let (a, b) = (&placements[i], &placements[j]);
            if intrudes(a.x, a.x + a.width, b.x, b.x + b.width)
                && intrudes(a.y, a.y + a.depth, b.y, b.y + b.depth)
                && intrudes(a.z, a.z + a.height, b.z, b.z + b.height)
            {
                warn!(
                    target: "solve.validate",
                    first = %a.name,
                    second = %b.name,
                    "overlap_violation"
                );
                diag.push(DiagEvent::Violation {
                    kind: ViolationKind::Overlap,
                    detail: format!("{} intersects {}", a.name, b.name),
                });
            }
        }
    }
}

/// Depth spread per wall section: within the strict band is ideal, within
/// the relaxed band is acceptable (noted), beyond it the wall cannot take
/// a single strap.
fn check_flat_face(sections: &[WallSection], tuning: &Tuning, diag: &mut Diagnostics) {
    for section in sections {
        if section.placements.is_empty() {
            continue;
        }
        let mut lo = f64::INFINITY;
        let mut hi: f64 = 0.0;
        for p in &section.placements {
            lo = lo.min(p.depth);
            hi = hi.max(p.depth);
        }
        let range = hi - lo;
        if range > tuning.depth_relaxed {
            warn!(
                target: "solve.validate",
                wall = %section.id,
                range,
                "flat_face_violation"
            );
            diag.push(DiagEvent::Violation {
                kind: ViolationKind::FlatFace,
                detail: format!(
                    "{}: depth range {:.1}\" exceeds {:.0}\"",
                    section.id, range, tuning.depth_relaxed
                ),
            });
        } else if range > tuning.depth_strict {
            diag.note(format!(
                "{}: depth range {:.1}\" is acceptable but not ideal",
                section.id, range
            ));
        }
    }
}
