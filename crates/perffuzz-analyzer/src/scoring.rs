//! Aggregate interestingness over a full anomaly-group list.
//!
//! Resolves the two Open Questions this analyzer inherits: a single
//! zero-scored TIMEOUT group must not veto a co-present, positively-scored
//! TIME/MEMORY group, and the aggregate is the mean (never a running sum)
//! of per-group scores.

use perffuzz_metrics::AnomalyGroup;

/// `false` iff the list is empty or every group scored zero.
#[must_use]
pub fn are_interesting(groups: &[AnomalyGroup]) -> bool {
    !groups.is_empty() && groups.iter().any(|g| g.interestingness > 0.0)
}

/// Zero when not interesting; otherwise the mean of per-group scores.
#[must_use]
pub fn overall_score(groups: &[AnomalyGroup]) -> f64 {
    if !are_interesting(groups) {
        return 0.0;
    }
    groups.iter().map(|g| g.interestingness).sum::<f64>() / groups.len() as f64
}
