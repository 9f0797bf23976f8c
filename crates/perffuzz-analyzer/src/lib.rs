//! Differential performance analyzer and compilation-profile comparator.
//!
//! The analyzer is a pure function of its inputs: given a set of per-runtime
//! measurements for one candidate and a significance level, it returns a
//! list of classified, scored [`AnomalyGroup`]s. The comparator extends that
//! with an optional compiler-behavior explanation layer, sourced from
//! per-runtime [`CompilationProfile`]s.

pub mod clustering;
pub mod comparator;
pub mod scoring;
pub mod stages;
pub mod thresholds;

pub use comparator::compare_profiles;
pub use scoring::{are_interesting, overall_score};
pub use stages::{AnalyzerConfig, analyze, analyze_with_compilation};
pub use thresholds::{SignificanceLevel, Thresholds};

pub use perffuzz_metrics::{AnomalyGroup, AnomalyKind};
