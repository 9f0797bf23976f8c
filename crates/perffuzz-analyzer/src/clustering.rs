//! Error-aware one-dimensional clustering shared by the TIME and MEMORY
//! stages of the analyzer.

/// One runtime's value + error bar for a single metric.
#[derive(Debug, Clone)]
pub struct MetricPoint {
    pub label: String,
    pub value: f64,
    pub error: f64,
}

/// `true` when the two `k`-scaled confidence intervals overlap.
#[must_use]
pub fn ci_overlap(v1: f64, e1: f64, v2: f64, e2: f64, k: f64) -> bool {
    let (lo1, hi1) = (v1 - k * e1, v1 + k * e1);
    let (lo2, hi2) = (v2 - k * e2, v2 + k * e2);
    lo1 <= hi2 && lo2 <= hi1
}

/// Adjusted pairwise deviation between two measurements, in percent.
///
/// Zero when the values are within combined error bars, or when the smaller
/// value is too close to zero to divide by safely.
#[must_use]
pub fn adjusted_deviation(v1: f64, e1: f64, v2: f64, e2: f64, k: f64) -> f64 {
    let d = (v1 - v2).abs();
    let e = k * (e1 + e2);
    if d <= e {
        return 0.0;
    }
    let min_v = v1.min(v2);
    if min_v < 1e-6 {
        return 0.0;
    }
    (d - e) / min_v * 100.0
}

/// Chain consecutive, sorted points into clusters.
///
/// Two adjacent points join the same cluster when their confidence
/// intervals overlap at `k`, or when their adjusted deviation is at most
/// half the significance threshold. Points are assumed pre-sorted by value.
#[must_use]
pub fn cluster(points: &[MetricPoint], k: f64, threshold_pct: f64) -> Vec<Vec<usize>> {
    if points.is_empty() {
        return Vec::new();
    }
    let mut clusters: Vec<Vec<usize>> = vec![vec![0]];
    for i in 1..points.len() {
        let prev = &points[i - 1];
        let cur = &points[i];
        let joins = ci_overlap(prev.value, prev.error, cur.value, cur.error, k)
            || adjusted_deviation(prev.value, prev.error, cur.value, cur.error, k) <= threshold_pct / 2.0;
        if joins {
            clusters.last_mut().expect("clusters non-empty").push(i);
        } else {
            clusters.push(vec![i]);
        }
    }
    clusters
}

/// Mean value and mean error of a cluster's points.
#[must_use]
pub fn cluster_mean(points: &[MetricPoint], indices: &[usize]) -> (f64, f64) {
    let n = indices.len() as f64;
    let value_sum: f64 = indices.iter().map(|&i| points[i].value).sum();
    let error_sum: f64 = indices.iter().map(|&i| points[i].error).sum();
    (value_sum / n, error_sum / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(label: &str, value: f64, error: f64) -> MetricPoint {
        MetricPoint {
            label: label.to_string(),
            value,
            error,
        }
    }

    #[test]
    fn overlapping_points_form_one_cluster() {
        let points = vec![pt("a", 100.0, 2.0), pt("b", 102.0, 2.0), pt("c", 200.0, 3.0)];
        let clusters = cluster(&points, 1.0, 10.0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0], vec![0, 1]);
        assert_eq!(clusters[1], vec![2]);
    }

    #[test]
    fn no_points_no_clusters() {
        assert!(cluster(&[], 1.0, 10.0).is_empty());
    }

    #[test]
    fn deviation_guards_against_near_zero_division() {
        assert_eq!(adjusted_deviation(1e-8, 0.0, 2e-8, 0.0, 1.0), 0.0);
    }

    #[test]
    fn smaller_k_never_shrinks_adjusted_deviation() {
        let (v1, e1, v2, e2) = (100.0, 5.0, 104.0, 5.0);
        let d_reporting = adjusted_deviation(v1, e1, v2, e2, 1.0);
        let d_seed_evolution = adjusted_deviation(v1, e1, v2, e2, 0.5);
        assert!(d_seed_evolution >= d_reporting);
    }
}
