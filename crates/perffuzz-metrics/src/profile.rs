//! Per-runtime compiler behavior extracted from one execution's logs.

use serde::{Deserialize, Serialize};

/// One JIT/AOT compilation event parsed from a runtime's log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationEvent {
    pub method_fqn: String,
    pub signature: String,
    /// Ordinal tier; higher means more aggressively optimized. Tier
    /// numbering is only meaningful within one profile — different
    /// runtimes' parsers are free to disagree on what tier 3 means.
    pub tier: u32,
    pub compile_time_us: f64,
    pub deopt: bool,
    pub inlined_children: Vec<String>,
}

/// All compilation events observed for one runtime during one run, plus the
/// aggregates the analyzer and comparator need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationProfile {
    pub runtime_label: String,
    pub events: Vec<CompilationEvent>,
    pub total_compilations: u64,
    pub total_compile_time_us: f64,
    pub max_tier: u32,
    /// Sum of inlined-children counts divided by event count.
    pub inlining_rate: f64,
    pub deopt_count: u64,
    pub unique_method_count: u64,
}

impl CompilationProfile {
    /// Build a profile from its raw event list, computing every aggregate.
    #[must_use]
    pub fn new(runtime_label: impl Into<String>, events: Vec<CompilationEvent>) -> Self {
        let total_compilations = events.len() as u64;
        let total_compile_time_us = events.iter().map(|e| e.compile_time_us).sum();
        let max_tier = events.iter().map(|e| e.tier).max().unwrap_or(0);
        let total_inlined: usize = events.iter().map(|e| e.inlined_children.len()).sum();
        let inlining_rate = if events.is_empty() {
            0.0
        } else {
            total_inlined as f64 / events.len() as f64
        };
        let deopt_count = events.iter().filter(|e| e.deopt).count() as u64;
        let unique_method_count = {
            let mut names: Vec<&str> = events.iter().map(|e| e.method_fqn.as_str()).collect();
            names.sort_unstable();
            names.dedup();
            names.len() as u64
        };

        Self {
            runtime_label: runtime_label.into(),
            events,
            total_compilations,
            total_compile_time_us,
            max_tier,
            inlining_rate,
            deopt_count,
            unique_method_count,
        }
    }

    /// Fraction of compilations that reached this profile's own ceiling
    /// tier. Zero when there were no compilations at all.
    #[must_use]
    pub fn high_tier_fraction(&self) -> f64 {
        if self.total_compilations == 0 {
            return 0.0;
        }
        let at_ceiling = self.events.iter().filter(|e| e.tier >= self.max_tier).count();
        at_ceiling as f64 / self.total_compilations as f64
    }

    /// `0.5*highTierFraction + 0.3*inliningRate + 0.2*(1 - min(1, deopts/compilations))`.
    ///
    /// Deterministic in the profile's own fields; always lies in `[0, 1]`
    /// because each term is itself clamped to `[0, 1]` before weighting.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        let deopt_ratio = if self.total_compilations == 0 {
            0.0
        } else {
            self.deopt_count as f64 / self.total_compilations as f64
        };
        0.5 * self.high_tier_fraction() + 0.3 * self.inlining_rate.min(1.0)
            + 0.2 * (1.0 - deopt_ratio.min(1.0))
    }

    /// Look up an event by method name, first match wins.
    #[must_use]
    pub fn event_for(&self, method_fqn: &str) -> Option<&CompilationEvent> {
        self.events.iter().find(|e| e.method_fqn == method_fqn)
    }
}

/// One method's contribution to the divergence between two profiles, per
/// the hot-method heuristic in the Profile Comparator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotMethodAnalysis {
    pub method_fqn: String,
    pub score: f64,
    pub faster_tier: Option<u32>,
    pub slower_tier: Option<u32>,
    pub note: String,
}

/// The outcome of comparing two runtimes' compilation profiles for one
/// input, with the lower-average-time side always `faster`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub faster_label: String,
    pub slower_label: String,
    pub efficiency_delta: f64,
    pub unique_in_faster: Vec<String>,
    pub unique_in_slower: Vec<String>,
    pub inlining_rate_delta: f64,
    pub compile_speed_delta: f64,
    /// In `[0, 1]`.
    pub compiler_related_probability: f64,
    pub explanation: String,
    /// Top-10 methods ranked by the hot-method heuristic, descending.
    pub hot_methods: Vec<HotMethodAnalysis>,
}
