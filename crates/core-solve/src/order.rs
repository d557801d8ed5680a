//! Phase 4: scoring and stage ordering.
//!
//! Lower score ranks first, toward the cab. The coefficients are part of
//! the output contract: the walls forming the back of the load must be
//! tall, full, departmentally coherent, flat-topped, and multi-column:
//! flat-topped so the next wall has a stable counterface, multi-column to
//! resist lateral collapse under braking forces. Changing any constant
//! changes observable output.

use core_config::Tuning;
use core_model::{DeptPriority, Diagnostics, TruckEnvelope, Wall};
use tracing::{debug, info};

/// A wall with its stage assignment, ready for coordinate emission.
#[derive(Debug, Clone)]
pub struct StagedWall {
    pub wall: Wall,
    pub stage_index: i32,
    pub label: String,
}

/// The literal ranking function.
pub fn wall_score(wall: &Wall, envelope: &TruckEnvelope, priority: &DeptPriority) -> i64 {
    let fill = wall.fill_ratio(envelope.width).min(1.0);
    let effective_height = wall.max_height * fill;
    let height_inv = (100.0 - effective_height).round() as i64;
    let dept_pri = priority.priority_of(wall.majority_dept()) as i64;
    let rel_group = wall.reliability.tier().min(4) as i64;
    let mut score = height_inv * 100 + dept_pri * 4 + rel_group;

    // Ragged tops are pushed toward the door.
    let height_range = wall.height_range();
    if height_range > 10.0 && envelope.height > 0.0 {
        score += ((height_range / envelope.height) * 3000.0).round() as i64;
    }
    score -= (wall.columns.len().min(4) as i64) * 50;
    if wall.columns.len() <= 2 && fill < 0.90 {
        score += 2000;
    }
    if fill < 0.50 {
        score += 5000;
    }
    score
}

/// Order the candidate walls cab-to-door and group the ordered run into
/// stages. `first_stage` is the index of the first non-floor stage (1
/// when floor walls occupy stage 0).
pub fn rank_and_stage(
    walls: Vec<Wall>,
    envelope: &TruckEnvelope,
    tuning: &Tuning,
    priority: &DeptPriority,
    first_stage: i32,
    diag: &mut Diagnostics,
) -> Vec<StagedWall> {
    let mut ranked: Vec<(Wall, i64, i64, f64)> = walls
        .into_iter()
        .map(|wall| {
            let score = wall_score(&wall, envelope, priority);
            let dept_pri = priority.priority_of(wall.majority_dept()) as i64;
            let fill = wall.fill_ratio(envelope.width).min(1.0);
            (wall, score, dept_pri, fill)
        })
        .collect();
    // Stable: fully tied walls keep construction order.
    ranked.sort_by(|a, b| {
        a.1.cmp(&b.1)
            .then(a.2.cmp(&b.2))
            .then(b.3.partial_cmp(&a.3).unwrap_or(std::cmp::Ordering::Equal))
    });
    for (wall, score, _, fill) in &ranked {
        debug!(
            target: "solve.order",
            groups = %wall.groups.join("+"),
            score,
            fill,
            tier = wall.reliability.tier(),
            "wall_ranked"
        );
    }

    // Stage grouping: a run of consecutive walls sharing reliability and
    // majority department, with max heights within the stage tolerance of
    // the stage seed.
    let mut staged: Vec<StagedWall> = Vec::new();
    let mut stage_index = first_stage - 1;
    let mut seed: Option<(core_model::Reliability, String, f64)> = None;
    for (wall, _, _, _) in ranked {
        let dept = wall.majority_dept().to_string();
        let same_stage = seed.as_ref().is_some_and(|(rel, sdept, sheight)| {
            *rel == wall.reliability
                && *sdept == dept
                && (wall.max_height - sheight).abs() <= tuning.stage_height_tol
        });
        if !same_stage {
            stage_index += 1;
            seed = Some((wall.reliability, dept.clone(), wall.max_height));
        }
        let label = format!("{} {}", dept, wall.reliability.label());
        staged.push(StagedWall {
            wall,
            stage_index,
            label,
        });
    }
    let stages = if staged.is_empty() {
        0
    } else {
        staged.last().map(|s| s.stage_index - first_stage + 1).unwrap_or(0)
    };
    info!(
        target: "solve.order",
        walls = staged.len(),
        stages,
        "walls_staged"
    );
    diag.note(format!(
        "order: {} wall(s) across {} stage(s)",
        staged.len(),
        stages
    ));
    staged
}
