//! Configuration loading and parsing.
//!
//! Parses `wallplanner.toml` (or an override path provided by the binary)
//! into truck geometry, solver tuning, department priority overrides, and
//! reserved knowledge-base patterns. Unknown fields are ignored (TOML
//! deserialization tolerance) to allow forward evolution without
//! immediate warnings; a file that fails to parse falls back to defaults.
//!
//! The tuning knobs are validated in `Config::sanitize`: a value outside
//! its meaningful range is clamped back to the documented default and the
//! clamp is logged under the `config` target. The raw parsed values are
//! retained so a later re-sanitize (e.g. after a programmatic override)
//! starts from what the operator wrote.

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::info;

use core_model::TruckEnvelope;

/// Minimum width fill for a Phase 2 wall to count as a full wall.
pub const WP_MIN_FILL: f64 = 0.80;
/// Fill above which a full wall is not considered for gap filling.
pub const WP_GAP_THRESH: f64 = 0.95;
/// Strict depth clustering tolerance (inches), Phase 3B pass 1.
pub const WP_DEPTH_STRICT: f64 = 2.0;
/// Relaxed depth tolerance (inches): pass 2 clustering, gap fill, merges,
/// and the flat-face acceptance band.
pub const WP_DEPTH_RELAXED: f64 = 8.0;
/// Load-bar spacer depth (inches) between floor-panel rows.
pub const WP_LOADBAR_GAP: f64 = 2.0;
/// Max height spread (inches) within one stage grouping.
pub const WP_STAGE_HEIGHT_TOL: f64 = 15.0;
/// Walls below this fill are dissolved column-by-column in Phase 3C.
pub const WP_ABSORB_THRESH: f64 = 0.50;

/// Solver tuning knobs, resolved and validated. Every field defaults to
/// the `WP_*` constant of the same name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub min_fill: f64,
    pub gap_thresh: f64,
    pub depth_strict: f64,
    pub depth_relaxed: f64,
    pub loadbar_gap: f64,
    pub stage_height_tol: f64,
    pub absorb_thresh: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            min_fill: WP_MIN_FILL,
            gap_thresh: WP_GAP_THRESH,
            depth_strict: WP_DEPTH_STRICT,
            depth_relaxed: WP_DEPTH_RELAXED,
            loadbar_gap: WP_LOADBAR_GAP,
            stage_height_tol: WP_STAGE_HEIGHT_TOL,
            absorb_thresh: WP_ABSORB_THRESH,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TuningConfig {
    #[serde(default = "defaults::min_fill")]
    pub min_fill: f64,
    #[serde(default = "defaults::gap_thresh")]
    pub gap_thresh: f64,
    #[serde(default = "defaults::depth_strict")]
    pub depth_strict: f64,
    #[serde(default = "defaults::depth_relaxed")]
    pub depth_relaxed: f64,
    #[serde(default = "defaults::loadbar_gap")]
    pub loadbar_gap: f64,
    #[serde(default = "defaults::stage_height_tol")]
    pub stage_height_tol: f64,
    #[serde(default = "defaults::absorb_thresh")]
    pub absorb_thresh: f64,
}

mod defaults {
    pub(super) fn min_fill() -> f64 {
        super::WP_MIN_FILL
    }
    pub(super) fn gap_thresh() -> f64 {
        super::WP_GAP_THRESH
    }
    pub(super) fn depth_strict() -> f64 {
        super::WP_DEPTH_STRICT
    }
    pub(super) fn depth_relaxed() -> f64 {
        super::WP_DEPTH_RELAXED
    }
    pub(super) fn loadbar_gap() -> f64 {
        super::WP_LOADBAR_GAP
    }
    pub(super) fn stage_height_tol() -> f64 {
        super::WP_STAGE_HEIGHT_TOL
    }
    pub(super) fn absorb_thresh() -> f64 {
        super::WP_ABSORB_THRESH
    }
    pub(super) fn truck_width() -> f64 {
        core_model::TruckEnvelope::DEFAULT_WIDTH
    }
    pub(super) fn truck_length() -> f64 {
        core_model::TruckEnvelope::default().length
    }
    pub(super) fn truck_height() -> f64 {
        core_model::TruckEnvelope::DEFAULT_HEIGHT
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        let t = Tuning::default();
        Self {
            min_fill: t.min_fill,
            gap_thresh: t.gap_thresh,
            depth_strict: t.depth_strict,
            depth_relaxed: t.depth_relaxed,
            loadbar_gap: t.loadbar_gap,
            stage_height_tol: t.stage_height_tol,
            absorb_thresh: t.absorb_thresh,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TruckConfig {
    #[serde(default = "defaults::truck_width")]
    pub width: f64,
    #[serde(default = "defaults::truck_length")]
    pub length: f64,
    #[serde(default = "defaults::truck_height")]
    pub height: f64,
}

impl Default for TruckConfig {
    fn default() -> Self {
        let e = TruckEnvelope::default();
        Self {
            width: e.width,
            length: e.length,
            height: e.height,
        }
    }
}

impl TruckConfig {
    pub fn envelope(&self) -> TruckEnvelope {
        TruckEnvelope::new(self.width, self.length, self.height)
    }
}

/// Reserved knowledge-base wall recipe. The universal mode carries no
/// patterns; a populated list is logged and ignored by the solver.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct KbPattern {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub truck: TruckConfig,
    #[serde(default)]
    pub tuning: TuningConfig,
    /// Explicit department priorities; unspecified tags fall back to the
    /// derived ordering.
    #[serde(default)]
    pub dept_priority: BTreeMap<String, u32>,
    #[serde(default)]
    pub kb_patterns: Vec<KbPattern>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,
    pub file: ConfigFile,
    /// Validated tuning; populated by `sanitize`.
    pub tuning: Tuning,
}

/// Best-effort config path: local working directory first, then the
/// platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("wallplanner.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("wallplanner").join("wallplanner.toml");
    }
    PathBuf::from("wallplanner.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let mut config = if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Config {
                raw: Some(content),
                file,
                tuning: Tuning::default(),
            },
            Err(_e) => {
                // Parse errors fall back to defaults; the solver must
                // never be blocked by a malformed operator file.
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    config.sanitize();
    Ok(config)
}

impl Config {
    /// Validate the parsed tuning values, clamping anything outside its
    /// meaningful range back to the default. Returns the resolved tuning.
    pub fn sanitize(&mut self) -> Tuning {
        let raw = self.file.tuning;
        let mut t = Tuning {
            min_fill: raw.min_fill,
            gap_thresh: raw.gap_thresh,
            depth_strict: raw.depth_strict,
            depth_relaxed: raw.depth_relaxed,
            loadbar_gap: raw.loadbar_gap,
            stage_height_tol: raw.stage_height_tol,
            absorb_thresh: raw.absorb_thresh,
        };
        let d = Tuning::default();
        fn clamped(name: &str, raw: f64, default: f64, ok: bool) -> f64 {
            if ok {
                return raw;
            }
            info!(
                target: "config",
                knob = name,
                raw,
                default,
                "tuning_value_clamped"
            );
            default
        }
        let ratio = |v: f64| v > 0.0 && v <= 1.0;
        t.min_fill = clamped("min_fill", t.min_fill, d.min_fill, ratio(t.min_fill));
        t.gap_thresh = clamped("gap_thresh", t.gap_thresh, d.gap_thresh, ratio(t.gap_thresh));
        t.absorb_thresh = clamped(
            "absorb_thresh",
            t.absorb_thresh,
            d.absorb_thresh,
            ratio(t.absorb_thresh),
        );
        t.depth_strict = clamped(
            "depth_strict",
            t.depth_strict,
            d.depth_strict,
            t.depth_strict > 0.0,
        );
        t.depth_relaxed = clamped(
            "depth_relaxed",
            t.depth_relaxed,
            d.depth_relaxed,
            t.depth_relaxed > 0.0,
        );
        t.loadbar_gap = clamped(
            "loadbar_gap",
            t.loadbar_gap,
            d.loadbar_gap,
            t.loadbar_gap >= 0.0,
        );
        t.stage_height_tol = clamped(
            "stage_height_tol",
            t.stage_height_tol,
            d.stage_height_tol,
            t.stage_height_tol >= 0.0,
        );
        // The strict band may never exceed the relaxed band.
        if t.depth_strict > t.depth_relaxed {
            info!(
                target: "config",
                strict = t.depth_strict,
                relaxed = t.depth_relaxed,
                "depth_bands_reordered"
            );
            t.depth_strict = t.depth_relaxed;
        }
        self.tuning = t;
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.tuning, Tuning::default());
        assert_eq!(cfg.file.truck.width, 98.0);
        assert!(cfg.file.kb_patterns.is_empty());
    }

    #[test]
    fn parses_truck_and_tuning_tables() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[truck]\nwidth = 96\nlength = 288\n\n[tuning]\nmin_fill = 0.75\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.truck.width, 96.0);
        assert_eq!(cfg.file.truck.length, 288.0);
        // Unspecified height keeps its default.
        assert_eq!(cfg.file.truck.height, 110.0);
        assert_eq!(cfg.tuning.min_fill, 0.75);
        assert_eq!(cfg.tuning.gap_thresh, WP_GAP_THRESH);
    }

    #[test]
    fn parses_dept_priority_overrides() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[dept_priority]\nRIGG = 1\nLX = 2\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.dept_priority.get("RIGG"), Some(&1));
        assert_eq!(cfg.file.dept_priority.get("LX"), Some(&2));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[truck\nwidth = ??").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.tuning, Tuning::default());
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[tuning]\nmin_fill = 7.5\ndepth_strict = -2\n").unwrap();
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let cfg = with_default(subscriber, || {
            load_from(Some(tmp.path().to_path_buf())).unwrap()
        });

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("tuning_value_clamped"));
        assert_eq!(cfg.tuning.min_fill, WP_MIN_FILL);
        assert_eq!(cfg.tuning.depth_strict, WP_DEPTH_STRICT);
    }

    #[test]
    fn strict_band_never_exceeds_relaxed() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[tuning]\ndepth_strict = 10\ndepth_relaxed = 6\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.tuning.depth_relaxed, 6.0);
        assert_eq!(cfg.tuning.depth_strict, 6.0);
    }
}
