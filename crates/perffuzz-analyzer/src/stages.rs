//! Stage 1 (special-case), Stage 2 (clustering), and Stage 3 (pairwise
//! emission) of the performance analyzer, plus the compiler-profile
//! enrichment pass.

use std::collections::{BTreeMap, BTreeSet};

use perffuzz_metrics::{AnomalyGroup, AnomalyKind, CompilationProfile, PerformanceMetrics};

use crate::clustering::{MetricPoint, cluster, cluster_mean};
use crate::comparator::compare_profiles;
use crate::thresholds::{SignificanceLevel, Thresholds};

/// Tunable weights and thresholds for one analyzer run.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerConfig {
    pub w_timeout: f64,
    pub w_error: f64,
    pub w_compiler: f64,
    /// Gate above which a compiler-profile comparison is synthesized into
    /// its own COMPILER anomaly group.
    pub compiler_probability_gate: f64,
    /// Overrides [`Thresholds::for_level`]'s time-deviation percentage for
    /// both significance levels. `None` keeps the level-derived default.
    pub time_pct: Option<f64>,
    /// Overrides [`Thresholds::for_level`]'s memory-deviation percentage.
    /// `None` keeps the level-derived default.
    pub memory_pct: Option<f64>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            w_timeout: 50.0,
            w_error: 50.0,
            w_compiler: 50.0,
            compiler_probability_gate: 0.3,
            time_pct: None,
            memory_pct: None,
        }
    }
}

impl AnalyzerConfig {
    /// Resolve this run's actual thresholds: the level's defaults, with any
    /// config override substituted in.
    fn thresholds(&self, level: SignificanceLevel) -> Thresholds {
        let mut t = Thresholds::for_level(level);
        if let Some(pct) = self.time_pct {
            t.time_pct = pct;
        }
        if let Some(pct) = self.memory_pct {
            t.memory_pct = pct;
        }
        t
    }
}

enum Metric {
    Time,
    Memory,
}

impl Metric {
    const fn kind(&self) -> AnomalyKind {
        match self {
            Self::Time => AnomalyKind::Time,
            Self::Memory => AnomalyKind::Memory,
        }
    }

    fn threshold(&self, t: Thresholds) -> f64 {
        match self {
            Self::Time => t.time_pct,
            Self::Memory => t.memory_pct,
        }
    }

    /// Extracts this metric's (value, error) for one runtime's `Ok`
    /// measurement, if the metric is present on it.
    fn point(&self, label: &str, m: &PerformanceMetrics) -> Option<MetricPoint> {
        match (self, m) {
            (Self::Time, PerformanceMetrics::Ok { score, error, .. }) => Some(MetricPoint {
                label: label.to_string(),
                value: *score,
                error: *error,
            }),
            (Self::Memory, PerformanceMetrics::Ok { memory_kb: Some(kb), .. }) => Some(MetricPoint {
                label: label.to_string(),
                value: *kb as f64,
                error: 0.0,
            }),
            _ => None,
        }
    }
}

/// Run the performance analyzer: timeout/error partitioning, then
/// error-aware clustering and pairwise emission for TIME and MEMORY.
#[must_use]
pub fn analyze(
    metrics: &BTreeMap<String, PerformanceMetrics>,
    level: SignificanceLevel,
    config: AnalyzerConfig,
) -> Vec<AnomalyGroup> {
    if metrics.len() < 2 {
        return Vec::new();
    }

    let mut groups = Vec::new();
    let total = metrics.len();

    let timed_out: BTreeSet<String> = metrics
        .iter()
        .filter(|(_, m)| m.timed_out())
        .map(|(l, _)| l.clone())
        .collect();
    let rest: BTreeSet<String> = metrics
        .keys()
        .filter(|l| !timed_out.contains(*l))
        .cloned()
        .collect();

    if !timed_out.is_empty() && !rest.is_empty() {
        groups.push(AnomalyGroup {
            kind: AnomalyKind::Timeout,
            faster: rest.clone(),
            slower: timed_out.clone(),
            avg_deviation: 100.0,
            max_deviation: 100.0,
            min_deviation: 100.0,
            pairwise_deviation: BTreeMap::new(),
            description: format!(
                "{} of {} runtimes timed out",
                timed_out.len(),
                total
            ),
            interestingness: config.w_timeout * (1.0 - timed_out.len() as f64 / total as f64),
            exit_codes: None,
            compiler_profile: None,
        });
    }

    let errored: BTreeSet<String> = rest
        .iter()
        .filter(|l| !metrics[*l].parse_success())
        .cloned()
        .collect();
    let validated: BTreeSet<String> = rest.difference(&errored).cloned().collect();

    if !errored.is_empty() && !validated.is_empty() {
        let mut buckets: BTreeMap<i32, BTreeSet<String>> = BTreeMap::new();
        for label in &errored {
            buckets
                .entry(metrics[label].exit_code())
                .or_default()
                .insert(label.clone());
        }
        for (exit_code, bucket) in buckets {
            let mut exit_codes = BTreeMap::new();
            for label in bucket.iter().chain(validated.iter()) {
                exit_codes.insert(label.clone(), metrics[label].exit_code());
            }
            groups.push(AnomalyGroup {
                kind: AnomalyKind::Error,
                faster: validated.clone(),
                slower: bucket.clone(),
                avg_deviation: 100.0,
                max_deviation: 100.0,
                min_deviation: 100.0,
                pairwise_deviation: BTreeMap::new(),
                description: format!(
                    "{} runtime(s) exited with code {exit_code}",
                    bucket.len()
                ),
                interestingness: config.w_error * (1.0 - bucket.len() as f64 / total as f64),
                exit_codes: Some(exit_codes),
                compiler_profile: None,
            });
        }
    }

    let survivors: BTreeMap<String, PerformanceMetrics> = metrics
        .iter()
        .filter(|(l, _)| validated.contains(*l))
        .map(|(l, m)| (l.clone(), m.clone()))
        .collect();

    let t = config.thresholds(level);
    let k = level.k();
    for metric in [Metric::Time, Metric::Memory] {
        groups.extend(emit_metric_groups(&survivors, &metric, k, t, &metric.kind()));
    }

    groups
}

fn emit_metric_groups(
    survivors: &BTreeMap<String, PerformanceMetrics>,
    metric: &Metric,
    k: f64,
    t: Thresholds,
    kind: &AnomalyKind,
) -> Vec<AnomalyGroup> {
    let mut points: Vec<MetricPoint> = survivors
        .iter()
        .filter_map(|(l, m)| metric.point(l, m))
        .collect();
    points.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal));

    let threshold = metric.threshold(t);
    let clusters = cluster(&points, k, threshold);
    if clusters.len() < 2 {
        return Vec::new();
    }

    let mut out = Vec::new();
    for i in 0..clusters.len() {
        for j in (i + 1)..clusters.len() {
            let (mean_i, err_i) = cluster_mean(&points, &clusters[i]);
            let (mean_j, err_j) = cluster_mean(&points, &clusters[j]);
            let disjoint = !crate::clustering::ci_overlap(mean_i, err_i, mean_j, err_j, k);
            if !disjoint {
                continue;
            }

            let (faster_idx, slower_idx) = if mean_i <= mean_j {
                (&clusters[i], &clusters[j])
            } else {
                (&clusters[j], &clusters[i])
            };

            let mut pairwise_deviation: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
            let mut deviations = Vec::new();
            for &si in slower_idx {
                let slower_point = &points[si];
                let mut row = BTreeMap::new();
                for &fi in faster_idx {
                    let faster_point = &points[fi];
                    let dev = crate::clustering::adjusted_deviation(
                        faster_point.value,
                        faster_point.error,
                        slower_point.value,
                        slower_point.error,
                        k,
                    );
                    row.insert(faster_point.label.clone(), dev);
                    deviations.push(dev);
                }
                pairwise_deviation.insert(slower_point.label.clone(), row);
            }

            let avg_dev = deviations.iter().sum::<f64>() / deviations.len() as f64;
            if avg_dev <= threshold {
                continue;
            }
            let max_dev = deviations.iter().cloned().fold(f64::MIN, f64::max);
            let min_dev = deviations.iter().cloned().fold(f64::MAX, f64::min);

            let faster: BTreeSet<String> = faster_idx.iter().map(|&i| points[i].label.clone()).collect();
            let slower: BTreeSet<String> = slower_idx.iter().map(|&i| points[i].label.clone()).collect();
            let size_balance =
                faster.len().min(slower.len()) as f64 / faster.len().max(slower.len()) as f64;

            out.push(AnomalyGroup {
                kind: *kind,
                description: format!(
                    "{:?} divergence: {} faster than {} by {avg_dev:.1}% on average",
                    kind,
                    faster.iter().cloned().collect::<Vec<_>>().join(","),
                    slower.iter().cloned().collect::<Vec<_>>().join(",")
                ),
                faster,
                slower,
                avg_deviation: avg_dev,
                max_deviation: max_dev,
                min_deviation: min_dev,
                pairwise_deviation,
                interestingness: (avg_dev / 10.0) * (0.5 + 0.5 * size_balance),
                exit_codes: None,
                compiler_profile: None,
            });
        }
    }
    out
}

/// Run [`analyze`], then optionally enrich TIME/MEMORY groups with the best
/// compilation-profile comparison and synthesize a COMPILER group when the
/// comparison's probability clears the configured gate.
#[must_use]
pub fn analyze_with_compilation(
    metrics: &BTreeMap<String, PerformanceMetrics>,
    profiles: Option<&BTreeMap<String, CompilationProfile>>,
    level: SignificanceLevel,
    config: AnalyzerConfig,
) -> Vec<AnomalyGroup> {
    let mut groups = analyze(metrics, level, config);

    let Some(profiles) = profiles else {
        return groups;
    };
    if profiles.len() < 2 {
        return groups;
    }

    let avg_time: BTreeMap<String, f64> = metrics
        .iter()
        .filter_map(|(l, m)| m.score().map(|s| (l.clone(), s)))
        .collect();

    let profile_list: Vec<CompilationProfile> = profiles.values().cloned().collect();
    let comparisons = compare_profiles(&profile_list, &avg_time);
    let Some(best) = comparisons
        .iter()
        .max_by(|a, b| {
            a.compiler_related_probability
                .partial_cmp(&b.compiler_related_probability)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .cloned()
    else {
        return groups;
    };

    for g in groups.iter_mut() {
        if matches!(g.kind, AnomalyKind::Time | AnomalyKind::Memory) {
            g.attach_compiler_profile(best.clone());
        }
    }

    if best.compiler_related_probability > config.compiler_probability_gate {
        groups.push(AnomalyGroup {
            kind: AnomalyKind::Compiler,
            faster: BTreeSet::new(),
            slower: BTreeSet::new(),
            avg_deviation: 0.0,
            max_deviation: 0.0,
            min_deviation: 0.0,
            pairwise_deviation: BTreeMap::new(),
            description: best.explanation.clone(),
            interestingness: best.compiler_related_probability * config.w_compiler,
            exit_codes: None,
            compiler_profile: Some(best),
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use perffuzz_metrics::PerformanceMetrics as M;
    use std::path::PathBuf;

    fn ok(score: f64, error: f64) -> M {
        M::Ok {
            score,
            error,
            min: score - error,
            max: score + error,
            memory_kb: None,
            report_path: PathBuf::from("/tmp/r.json"),
        }
    }

    #[test]
    fn scenario_a_time_anomaly_reporting() {
        let mut metrics = BTreeMap::new();
        metrics.insert("hotspot".to_string(), ok(100.0, 2.0));
        metrics.insert("graal".to_string(), ok(102.0, 2.0));
        metrics.insert("openj9".to_string(), ok(200.0, 3.0));

        let groups = analyze(&metrics, SignificanceLevel::Reporting, AnalyzerConfig::default());
        let time_groups: Vec<_> = groups.iter().filter(|g| g.kind == AnomalyKind::Time).collect();
        assert_eq!(time_groups.len(), 1);
        let g = time_groups[0];
        assert_eq!(g.faster.len(), 2);
        assert_eq!(g.slower.len(), 1);
        assert!(g.slower.contains("openj9"));
        assert!(g.avg_deviation > 90.0 && g.avg_deviation < 97.0);
        assert!(g.interestingness > 6.0 && g.interestingness < 8.0);
    }

    #[test]
    fn scenario_b_partial_timeout() {
        let mut metrics = BTreeMap::new();
        metrics.insert("a".to_string(), M::TimedOut { exit_code: -100 });
        metrics.insert("b".to_string(), M::TimedOut { exit_code: -100 });
        metrics.insert("c".to_string(), ok(100.0, 1.0));
        metrics.insert("d".to_string(), ok(100.5, 1.0));

        let groups = analyze(&metrics, SignificanceLevel::Reporting, AnalyzerConfig::default());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, AnomalyKind::Timeout);
        assert_eq!(groups[0].interestingness, 25.0);
    }

    #[test]
    fn all_timed_out_yields_empty_list() {
        let mut metrics = BTreeMap::new();
        metrics.insert("a".to_string(), M::TimedOut { exit_code: -100 });
        metrics.insert("b".to_string(), M::TimedOut { exit_code: -100 });
        assert!(analyze(&metrics, SignificanceLevel::Reporting, AnalyzerConfig::default()).is_empty());
    }

    #[test]
    fn fewer_than_two_runtimes_yields_empty_list() {
        let mut metrics = BTreeMap::new();
        metrics.insert("a".to_string(), ok(100.0, 1.0));
        assert!(analyze(&metrics, SignificanceLevel::Reporting, AnalyzerConfig::default()).is_empty());
    }

    #[test]
    fn error_bucket_covering_all_runtimes_yields_no_error_group() {
        let mut metrics = BTreeMap::new();
        metrics.insert("a".to_string(), M::ParseFailure { exit_code: 1 });
        metrics.insert("b".to_string(), M::ParseFailure { exit_code: 1 });
        let groups = analyze(&metrics, SignificanceLevel::Reporting, AnalyzerConfig::default());
        assert!(groups.iter().all(|g| g.kind != AnomalyKind::Error));
    }

    #[test]
    fn every_time_or_memory_group_satisfies_invariants() {
        let mut metrics = BTreeMap::new();
        metrics.insert("a".to_string(), ok(100.0, 1.0));
        metrics.insert("b".to_string(), ok(250.0, 1.0));
        let groups = analyze(&metrics, SignificanceLevel::Reporting, AnalyzerConfig::default());
        for g in &groups {
            if matches!(g.kind, AnomalyKind::Time | AnomalyKind::Memory) {
                assert!(g.is_disjoint());
                assert!(g.avg_deviation > Thresholds::for_level(SignificanceLevel::Reporting).time_pct);
            }
        }
    }

    #[test]
    fn config_overrides_the_level_derived_threshold() {
        let mut metrics = BTreeMap::new();
        metrics.insert("a".to_string(), ok(100.0, 1.0));
        metrics.insert("b".to_string(), ok(102.0, 1.0));
        // A 2% gap clears the SeedEvolution default (1%) but not a config
        // override tightened all the way down to... nothing, since raising
        // the threshold above the gap suppresses the group entirely.
        let default_groups = analyze(&metrics, SignificanceLevel::SeedEvolution, AnalyzerConfig::default());
        assert!(default_groups.iter().any(|g| g.kind == AnomalyKind::Time));

        let strict_config = AnalyzerConfig {
            time_pct: Some(50.0),
            ..AnalyzerConfig::default()
        };
        let strict_groups = analyze(&metrics, SignificanceLevel::SeedEvolution, strict_config);
        assert!(strict_groups.iter().all(|g| g.kind != AnomalyKind::Time));
    }

    #[test]
    fn analyze_is_pure_in_its_inputs() {
        let mut metrics = BTreeMap::new();
        metrics.insert("a".to_string(), ok(100.0, 1.0));
        metrics.insert("b".to_string(), ok(250.0, 1.0));
        metrics.insert("c".to_string(), ok(101.0, 1.0));

        let first = analyze(&metrics, SignificanceLevel::Reporting, AnalyzerConfig::default());
        let second = analyze(&metrics, SignificanceLevel::Reporting, AnalyzerConfig::default());
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }
}
