//! Batch confirmation: a candidate anomaly only survives into a report once
//! a heavier REPORTING-level remeasurement reproduces it. On reproduction the
//! seed's anomalies/interestingness are replaced by the fresh remeasurement;
//! on failure, interestingness is dampened by a decade-bracketed divisor (or
//! forced to a near-zero floor for MEMORY candidates).

use serde::{Deserialize, Serialize};

use perffuzz_analyzer::overall_score;
use perffuzz_metrics::{AnomalyGroup, AnomalyKind};

/// Tunable batching parameters.
#[derive(Debug, Clone, Copy)]
pub struct VerifierConfig {
    /// Candidate queue length that triggers a batch pass.
    pub batch_size: usize,
    /// How many of the queued candidates (by descending interestingness)
    /// a batch actually re-verifies.
    pub top_n: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self { batch_size: 20, top_n: 5 }
    }
}

/// Confirmation floor a reproduced-but-dampened-to-nothing MEMORY candidate
/// is still reported at; memory signals are the dominant source of false
/// positives on this class of measurement, but never fully zero.
const MEMORY_CONFIRMATION_FLOOR: f64 = 0.01;

/// Divisor for an unreproduced candidate's prior interestingness, bracketed
/// by the magnitude of that prior value itself (not by how many times it
/// was retried — there is no retry loop here, just one heavier
/// remeasurement).
fn dampening_divisor(prior_interestingness: f64) -> f64 {
    match prior_interestingness {
        x if x <= 2.0 => 2.0,
        x if x <= 10.0 => 10.0,
        x if x <= 200.0 => 200.0,
        x if x <= 5000.0 => 5000.0,
        _ => 10000.0,
    }
}

/// Outcome of confirming one candidate against a single REPORTING-level
/// remeasurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedAnomaly {
    pub confirmed: bool,
    /// On reproduction, the fresh remeasurement's anomaly groups; empty on
    /// failure to reproduce.
    pub anomalies: Vec<AnomalyGroup>,
    /// On reproduction, the remeasurement's own score; on failure, the
    /// dampened (or floored) prior interestingness.
    pub interestingness: f64,
}

pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    #[must_use]
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// A batch pass is due once the candidate queue reaches `batch_size`.
    #[must_use]
    pub fn should_perform_batch(&self, queue_len: usize) -> bool {
        queue_len >= self.config.batch_size
    }

    #[must_use]
    pub fn top_n(&self) -> usize {
        self.config.top_n
    }

    /// Rank candidates by descending interestingness and take the top
    /// `top_n` for confirmation; the rest stay queued for the next batch.
    #[must_use]
    pub fn select_batch<'a>(&self, candidates: &'a [AnomalyGroup]) -> Vec<&'a AnomalyGroup> {
        let mut sorted: Vec<&AnomalyGroup> = candidates.iter().collect();
        sorted.sort_by(|a, b| {
            b.interestingness
                .partial_cmp(&a.interestingness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted.truncate(self.config.top_n);
        sorted
    }

    /// Confirm `original` against one heavier REPORTING-level remeasurement.
    /// A non-empty remeasurement (the analyzer already filters by
    /// significance threshold internally) reproduces; its groups and score
    /// replace the candidate's. An empty remeasurement dampens: a MEMORY
    /// original collapses to [`MEMORY_CONFIRMATION_FLOOR`], anything else
    /// divides its prior interestingness by [`dampening_divisor`].
    #[must_use]
    pub fn confirm(&self, original: &AnomalyGroup, remeasurement: Vec<AnomalyGroup>) -> VerifiedAnomaly {
        if !remeasurement.is_empty() {
            let interestingness = overall_score(&remeasurement);
            return VerifiedAnomaly {
                confirmed: true,
                anomalies: remeasurement,
                interestingness,
            };
        }

        let interestingness = if original.kind == AnomalyKind::Memory {
            MEMORY_CONFIRMATION_FLOOR
        } else {
            original.interestingness / dampening_divisor(original.interestingness)
        };
        VerifiedAnomaly {
            confirmed: false,
            anomalies: Vec::new(),
            interestingness,
        }
    }

    /// Confirm every selected candidate in one batch pass, pairing each
    /// with its own remeasurement by position.
    #[must_use]
    pub fn confirm_batch(&self, candidates: &[AnomalyGroup], remeasurements: Vec<Vec<AnomalyGroup>>) -> Vec<VerifiedAnomaly> {
        let selected = self.select_batch(candidates);
        let mut remeasurements = remeasurements.into_iter();
        selected
            .into_iter()
            .map(|g| self.confirm(g, remeasurements.next().unwrap_or_default()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn group(kind: AnomalyKind, slower: &[&str], interestingness: f64) -> AnomalyGroup {
        AnomalyGroup {
            kind,
            faster: BTreeSet::new(),
            slower: slower.iter().map(|s| s.to_string()).collect(),
            avg_deviation: 40.0,
            max_deviation: 40.0,
            min_deviation: 40.0,
            pairwise_deviation: BTreeMap::new(),
            description: String::new(),
            interestingness,
            exit_codes: None,
            compiler_profile: None,
        }
    }

    #[test]
    fn batch_gate_respects_configured_size() {
        let v = Verifier::new(VerifierConfig {
            batch_size: 5,
            ..VerifierConfig::default()
        });
        assert!(!v.should_perform_batch(4));
        assert!(v.should_perform_batch(5));
    }

    #[test]
    fn select_batch_takes_top_n_by_interestingness() {
        let v = Verifier::new(VerifierConfig {
            top_n: 2,
            ..VerifierConfig::default()
        });
        let candidates = vec![
            group(AnomalyKind::Time, &["a"], 1.0),
            group(AnomalyKind::Time, &["b"], 9.0),
            group(AnomalyKind::Time, &["c"], 5.0),
        ];
        let batch = v.select_batch(&candidates);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].interestingness, 9.0);
        assert_eq!(batch[1].interestingness, 5.0);
    }

    #[test]
    fn reproduction_adopts_the_fresh_remeasurement_verbatim() {
        let v = Verifier::new(VerifierConfig::default());
        let original = group(AnomalyKind::Time, &["openj9"], 10.0);
        let remeasurement = vec![group(AnomalyKind::Time, &["openj9"], 8.0)];
        let result = v.confirm(&original, remeasurement);
        assert!(result.confirmed);
        assert_eq!(result.anomalies.len(), 1);
        assert_eq!(result.interestingness, 8.0);
    }

    #[test]
    fn failed_confirmation_divides_by_the_bracket_for_its_own_magnitude() {
        let v = Verifier::new(VerifierConfig::default());
        let cases = [(1.5, 2.0), (8.0, 10.0), (150.0, 200.0), (3000.0, 5000.0), (50_000.0, 10000.0)];
        for (prior, divisor) in cases {
            let original = group(AnomalyKind::Time, &["openj9"], prior);
            let result = v.confirm(&original, Vec::new());
            assert!(!result.confirmed);
            assert!(result.anomalies.is_empty());
            assert!((result.interestingness - prior / divisor).abs() < 1e-9, "prior={prior}");
        }
    }

    #[test]
    fn memory_failures_collapse_to_the_floor_regardless_of_prior_magnitude() {
        let v = Verifier::new(VerifierConfig::default());
        let original = group(AnomalyKind::Memory, &["openj9"], 5000.0);
        let result = v.confirm(&original, Vec::new());
        assert!(!result.confirmed);
        assert!((result.interestingness - MEMORY_CONFIRMATION_FLOOR).abs() < 1e-9);
    }
}
