//! Wallplanner entrypoint: load a case manifest, solve, print the plan.

use anyhow::{Context, Result, bail};
use clap::Parser;
use core_model::{DiagEvent, LoadPlan, TruckEnvelope, base_group_tag};
use core_solve::{SolveOptions, solve};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "wallplanner", version, about = "Truck load wall planner")]
struct Args {
    /// Case manifest: TOML (`[[case]]` tables) or a JSON array.
    pub manifest: PathBuf,
    /// Optional configuration file path (overrides discovery of
    /// `wallplanner.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Emit the full plan as JSON on stdout instead of the summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default, rename = "case")]
    cases: Vec<core_model::CaseSpec>,
}

/// Machine-readable plan envelope for `--json`.
#[derive(Serialize)]
struct PlanOutput<'a> {
    placements: &'a [core_model::Placement],
    wall_sections: &'a [core_model::WallSection],
    diagnostics: &'a [DiagEvent],
    counters: core_model::SolveCounters,
}

fn configure_logging() -> Result<WorkerGuard> {
    let appender = tracing_appender::rolling::never(".", "wallplanner.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!(target: "runtime", %info, "panic");
        default_hook(info);
    }));
}

fn load_manifest(path: &Path) -> Result<Vec<core_model::CaseSpec>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let cases = if is_json {
        serde_json::from_str::<Vec<core_model::CaseSpec>>(&content)
            .with_context(|| format!("parsing JSON manifest {}", path.display()))?
    } else {
        toml::from_str::<Manifest>(&content)
            .with_context(|| format!("parsing TOML manifest {}", path.display()))?
            .cases
    };
    if cases.is_empty() {
        bail!("manifest {} contains no cases", path.display());
    }
    Ok(cases)
}

fn render_summary(plan: &LoadPlan, envelope: &TruckEnvelope) {
    println!(
        "Load plan: {} case(s) in {} wall(s), {:.0}\" of {:.0}\" used",
        plan.placements.len(),
        plan.wall_sections.len(),
        plan.depth_used(),
        envelope.length
    );
    for section in &plan.wall_sections {
        // Show base tags; the synthetic dimension suffixes from group
        // splitting are noise at this altitude.
        let mut tags: Vec<&str> = Vec::new();
        for p in &section.placements {
            let tag = base_group_tag(&p.group);
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        println!(
            "  {:>6}  stage {:>2}  y {:6.1}..{:6.1}  fill {:5.1}%  {:2} case(s)  {} [{}]",
            section.id,
            section.stage,
            section.y_start,
            section.y_end,
            section.fill_pct,
            section.case_count,
            section.label,
            tags.join(", ")
        );
    }
    if plan.depth_used() > envelope.length {
        println!(
            "WARNING: load runs {:.1}\" past the door",
            plan.depth_used() - envelope.length
        );
    }
    let violations: Vec<_> = plan.diagnostics.violations().collect();
    if !violations.is_empty() {
        println!("{} violation(s):", violations.len());
        for v in violations {
            if let DiagEvent::Violation { kind, detail } = v {
                println!("  {kind:?}: {detail}");
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging()?;
    install_panic_hook();
    info!(target: "runtime", manifest = %args.manifest.display(), "startup");

    let config = core_config::load_from(args.config.clone())?;
    let specs = load_manifest(&args.manifest)?;
    let envelope = config.file.truck.envelope();
    let options = SolveOptions::from_config(&config);

    let plan = solve(&specs, envelope, &options)?;

    if args.json {
        let output = PlanOutput {
            placements: &plan.placements,
            wall_sections: &plan.wall_sections,
            diagnostics: plan.diagnostics.events(),
            counters: plan.diagnostics.counters(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        render_summary(&plan, &envelope);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_manifest_parses_case_tables() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            r#"
[[case]]
name = "Amp #1"
width = 30.0
depth = 30.0
height = 44.0
dept = "SON"
group = "Amps"

[[case]]
name = "Dimmer #1"
width = 26.0
depth = 28.0
height = 24.0
stackable = true
max_stack = 3
"#,
        )
        .unwrap();
        let cases = load_manifest(tmp.path()).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].dept, "SON");
        // Defaults fill the second record.
        assert_eq!(cases[1].dept, "GENERAL");
        assert_eq!(cases[1].max_stack, 3);
        assert!(cases[1].allow_rotation);
    }

    #[test]
    fn json_manifest_parses_an_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("load.json");
        std::fs::write(
            &path,
            r#"[{"name": "Amp", "width": 30, "depth": 30, "height": 44}]"#,
        )
        .unwrap();
        let cases = load_manifest(&path).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].group, None);
    }

    #[test]
    fn empty_manifest_is_an_error() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "").unwrap();
        assert!(load_manifest(tmp.path()).is_err());
    }
}
