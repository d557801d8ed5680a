//! Diagnostic surface of a solve run.
//!
//! The solver reports, it never retries: every notable action (skipped
//! case, merge, absorption, spillover, post-emission violation) is
//! recorded here in occurrence order and mirrored to the tracing log by
//! the phase that produced it. Counters summarize the run for tests and
//! the end-of-solve log line; they are plain integers because the solver
//! is a pure synchronous function.

use serde::Serialize;

/// Severity buckets for the flat-face check and bounds/overlap findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViolationKind {
    Bounds,
    Overlap,
    FlatFace,
}

/// One diagnostic record. Order of records matches occurrence order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DiagEvent {
    /// Phase transition or free-form note.
    Note(String),
    /// Input case skipped before solving (non-positive dimension, or the
    /// envelope itself was unusable).
    InvalidCase { name: String, reason: String },
    /// A weak wall was folded into another.
    Merge { absorbed: String, into: String },
    /// A single column migrated to a stronger wall.
    Absorb { group: String, into: String },
    /// A case could not be emitted in its owning wall and was queued for
    /// recovery.
    Spillover { name: String },
    /// Post-placement invariant finding. Placements are returned as-is.
    Violation { kind: ViolationKind, detail: String },
}

/// Counter snapshot for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolveCounters {
    pub cases_skipped: u64,
    pub walls_built: u64,
    pub walls_merged: u64,
    pub columns_absorbed: u64,
    pub walls_rebuilt: u64,
    pub spillovers: u64,
    pub violations: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    events: Vec<DiagEvent>,
    counters: SolveCounters,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: DiagEvent) {
        match &event {
            DiagEvent::InvalidCase { .. } => self.counters.cases_skipped += 1,
            DiagEvent::Merge { .. } => self.counters.walls_merged += 1,
            DiagEvent::Absorb { .. } => self.counters.columns_absorbed += 1,
            DiagEvent::Spillover { .. } => self.counters.spillovers += 1,
            DiagEvent::Violation { .. } => self.counters.violations += 1,
            DiagEvent::Note(_) => {}
        }
        self.events.push(event);
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.push(DiagEvent::Note(message.into()));
    }

    pub fn record_wall_built(&mut self) {
        self.counters.walls_built += 1;
    }

    pub fn record_wall_rebuilt(&mut self) {
        self.counters.walls_rebuilt += 1;
    }

    pub fn events(&self) -> &[DiagEvent] {
        &self.events
    }

    pub fn counters(&self) -> SolveCounters {
        self.counters
    }

    pub fn violations(&self) -> impl Iterator<Item = &DiagEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, DiagEvent::Violation { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_event_kinds() {
        let mut d = Diagnostics::new();
        d.note("phase 2: building full walls");
        d.push(DiagEvent::InvalidCase {
            name: "bad".to_string(),
            reason: "width <= 0".to_string(),
        });
        d.push(DiagEvent::Spillover {
            name: "wide".to_string(),
        });
        d.push(DiagEvent::Violation {
            kind: ViolationKind::Bounds,
            detail: "x+w exceeds truck width".to_string(),
        });
        let c = d.counters();
        assert_eq!(c.cases_skipped, 1);
        assert_eq!(c.spillovers, 1);
        assert_eq!(c.violations, 1);
        assert_eq!(d.events().len(), 4);
        assert_eq!(d.violations().count(), 1);
    }
}
