//! Classified performance divergences across a set of runtimes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::profile::ComparisonResult;

/// The closed set of divergence classes the analyzer can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnomalyKind {
    Time,
    Memory,
    Timeout,
    Error,
    Compiler,
}

/// One classified, scored divergence across runtimes for a single input.
///
/// `faster` and `slower` are disjoint by construction; for `Timeout` and
/// `Error` kinds "faster" means the well-behaved cohort (did not time out /
/// did not error), not a lower measured score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyGroup {
    pub kind: AnomalyKind,
    pub faster: BTreeSet<String>,
    pub slower: BTreeSet<String>,
    pub avg_deviation: f64,
    pub max_deviation: f64,
    pub min_deviation: f64,
    /// `slower_label -> { faster_label -> pairwise deviation percent }`.
    pub pairwise_deviation: BTreeMap<String, BTreeMap<String, f64>>,
    pub description: String,
    pub interestingness: f64,
    /// Present only for `Error` groups: each runtime's observed exit code.
    pub exit_codes: Option<BTreeMap<String, i32>>,
    /// Present when a compiler-profile comparison was attached to this
    /// group (TIME/MEMORY groups enriched post-hoc, or the synthesized
    /// COMPILER group itself).
    pub compiler_profile: Option<ComparisonResult>,
}

impl AnomalyGroup {
    /// `faster` and `slower` share no runtime label.
    #[must_use]
    pub fn is_disjoint(&self) -> bool {
        self.faster.is_disjoint(&self.slower)
    }

    /// Attach (or replace) the compiler-profile enrichment payload.
    pub fn attach_compiler_profile(&mut self, comparison: ComparisonResult) {
        self.compiler_profile = Some(comparison);
    }
}
