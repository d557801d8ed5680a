//! Phase 3A: knowledge-base recipe hook.
//!
//! The interface reserves a slot for matching precomputed multi-group
//! wall templates. The universal mode passes an empty pattern set and
//! this hook is a no-op; a populated set is logged and ignored because
//! its matching algorithm is unspecified.

use core_config::KbPattern;
use core_model::{Diagnostics, Wall};
use tracing::warn;

pub fn apply_kb_patterns(patterns: &[KbPattern], diag: &mut Diagnostics) -> Vec<Wall> {
    if !patterns.is_empty() {
        warn!(
            target: "solve",
            patterns = patterns.len(),
            "kb_patterns_ignored"
        );
        diag.note(format!(
            "kb: {} pattern(s) supplied but recipe matching is not available; ignoring",
            patterns.len()
        ));
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pattern_set_is_silent() {
        let mut diag = Diagnostics::new();
        assert!(apply_kb_patterns(&[], &mut diag).is_empty());
        assert!(diag.events().is_empty());
    }

    #[test]
    fn populated_pattern_set_is_noted_and_ignored() {
        let mut diag = Diagnostics::new();
        let patterns = vec![KbPattern {
            name: "combo".to_string(),
            groups: vec!["A".to_string(), "B".to_string()],
        }];
        assert!(apply_kb_patterns(&patterns, &mut diag).is_empty());
        assert_eq!(diag.events().len(), 1);
    }
}
