//! Profile Comparator: pairwise compilation-profile comparisons and the
//! hot-method ranking heuristic.

use std::collections::{BTreeMap, BTreeSet};

use perffuzz_metrics::{CompilationProfile, ComparisonResult, HotMethodAnalysis};

const TOP_N_HOT_METHODS: usize = 10;

/// Produce one [`ComparisonResult`] per unordered pair of profiles, with the
/// lower-average-time side (per `avg_time`) always `faster`.
#[must_use]
pub fn compare_profiles(
    profiles: &[CompilationProfile],
    avg_time: &BTreeMap<String, f64>,
) -> Vec<ComparisonResult> {
    let mut out = Vec::new();
    for i in 0..profiles.len() {
        for j in (i + 1)..profiles.len() {
            let (a, b) = (&profiles[i], &profiles[j]);
            let a_time = avg_time.get(&a.runtime_label).copied().unwrap_or(f64::MAX);
            let b_time = avg_time.get(&b.runtime_label).copied().unwrap_or(f64::MAX);
            let (faster, slower) = if a_time <= b_time { (a, b) } else { (b, a) };
            out.push(compare_pair(faster, slower));
        }
    }
    out
}

fn compare_pair(faster: &CompilationProfile, slower: &CompilationProfile) -> ComparisonResult {
    let faster_methods: BTreeSet<&str> = faster.events.iter().map(|e| e.method_fqn.as_str()).collect();
    let slower_methods: BTreeSet<&str> = slower.events.iter().map(|e| e.method_fqn.as_str()).collect();

    let unique_in_faster: Vec<String> = faster_methods
        .difference(&slower_methods)
        .map(|s| s.to_string())
        .collect();
    let unique_in_slower: Vec<String> = slower_methods
        .difference(&faster_methods)
        .map(|s| s.to_string())
        .collect();

    let efficiency_delta = faster.efficiency() - slower.efficiency();
    let inlining_rate_delta = faster.inlining_rate - slower.inlining_rate;
    let compile_speed_delta = slower.total_compile_time_us - faster.total_compile_time_us;

    let level_factor = if faster.max_tier > slower.max_tier {
        0.6
    } else if faster.max_tier < slower.max_tier {
        0.2
    } else {
        0.3
    };

    let deopt_factor = if slower.deopt_count <= faster.deopt_count {
        0.0
    } else {
        let delta_deopts = (slower.deopt_count - faster.deopt_count) as f64;
        (5.0 * delta_deopts / slower.total_compilations.max(1) as f64).min(0.8)
    };

    let inlining_factor = (3.0 * inlining_rate_delta.abs()).min(0.7);

    let compiler_related_probability = (0.4 * (3.0 * efficiency_delta.abs()).min(1.0)
        + 0.2 * level_factor
        + 0.3 * deopt_factor
        + 0.1 * inlining_factor)
        .min(1.0);

    let explanation = format!(
        "{} reached max tier {} ({} compilations, {:.1}% high-tier, {} deopts) vs {} at max tier {} ({} compilations, {} deopts); compiler-related probability {:.2}",
        faster.runtime_label,
        faster.max_tier,
        faster.total_compilations,
        faster.high_tier_fraction() * 100.0,
        faster.deopt_count,
        slower.runtime_label,
        slower.max_tier,
        slower.total_compilations,
        slower.deopt_count,
        compiler_related_probability
    );

    let hot_methods = rank_hot_methods(faster, slower);

    ComparisonResult {
        faster_label: faster.runtime_label.clone(),
        slower_label: slower.runtime_label.clone(),
        efficiency_delta,
        unique_in_faster,
        unique_in_slower,
        inlining_rate_delta,
        compile_speed_delta,
        compiler_related_probability,
        explanation,
        hot_methods,
    }
}

fn rank_hot_methods(faster: &CompilationProfile, slower: &CompilationProfile) -> Vec<HotMethodAnalysis> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    names.extend(faster.events.iter().map(|e| e.method_fqn.as_str()));
    names.extend(slower.events.iter().map(|e| e.method_fqn.as_str()));

    let mut scored: Vec<HotMethodAnalysis> = names
        .into_iter()
        .map(|name| score_method(name, faster, slower))
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.method_fqn.cmp(&b.method_fqn))
    });
    scored.truncate(TOP_N_HOT_METHODS);
    scored
}

fn score_method(name: &str, faster: &CompilationProfile, slower: &CompilationProfile) -> HotMethodAnalysis {
    let f = faster.event_for(name);
    let s = slower.event_for(name);
    let mut score = 0.0;
    let mut notes = Vec::new();

    if let Some(e) = f {
        if e.tier >= faster.max_tier {
            score += 3.0;
            notes.push("at faster's max tier".to_string());
        }
        score += 0.5 * e.inlined_children.len() as f64;
    }
    if let Some(e) = s {
        if e.tier >= slower.max_tier {
            score += 3.0;
            notes.push("at slower's max tier".to_string());
        }
        score += 0.5 * e.inlined_children.len() as f64;
    }

    match (f, s) {
        (Some(fe), Some(se)) => {
            if fe.tier != se.tier {
                score += 1.5 * (fe.tier as f64 - se.tier as f64).abs();
                notes.push(format!("tier {} vs {}", fe.tier, se.tier));
            }
            if fe.deopt != se.deopt {
                score += 5.0;
                notes.push("deopt status differs".to_string());
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            score += 2.0;
            notes.push("present on one side only".to_string());
        }
        (None, None) => unreachable!("method name came from the union of both profiles"),
    }

    HotMethodAnalysis {
        method_fqn: name.to_string(),
        score,
        faster_tier: f.map(|e| e.tier),
        slower_tier: s.map(|e| e.tier),
        note: notes.join("; "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perffuzz_metrics::CompilationEvent;

    fn event(name: &str, tier: u32, deopt: bool, inlined: usize) -> CompilationEvent {
        CompilationEvent {
            method_fqn: name.to_string(),
            signature: "()V".to_string(),
            tier,
            compile_time_us: 5.0,
            deopt,
            inlined_children: (0..inlined).map(|i| format!("child{i}")).collect(),
        }
    }

    #[test]
    fn probability_and_efficiency_are_bounded() {
        let faster = CompilationProfile::new(
            "hotspot",
            vec![event("hot", 4, false, 3), event("warm", 3, false, 1)],
        );
        let slower = CompilationProfile::new(
            "openj9",
            vec![event("hot", 1, true, 0), event("cold", 1, false, 0)],
        );
        let mut avg_time = BTreeMap::new();
        avg_time.insert("hotspot".to_string(), 100.0);
        avg_time.insert("openj9".to_string(), 250.0);

        let results = compare_profiles(&[faster.clone(), slower.clone()], &avg_time);
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.faster_label, "hotspot");
        assert!((0.0..=1.0).contains(&r.compiler_related_probability));
        assert!(!r.hot_methods.is_empty());
        assert!(r.hot_methods.len() <= TOP_N_HOT_METHODS);
    }

    #[test]
    fn hot_methods_are_capped_at_ten() {
        let events_f: Vec<_> = (0..20).map(|i| event(&format!("m{i}"), 4, false, 0)).collect();
        let events_s: Vec<_> = (0..20).map(|i| event(&format!("m{i}"), 1, i % 3 == 0, 0)).collect();
        let faster = CompilationProfile::new("a", events_f);
        let slower = CompilationProfile::new("b", events_s);
        let mut avg_time = BTreeMap::new();
        avg_time.insert("a".to_string(), 1.0);
        avg_time.insert("b".to_string(), 2.0);
        let results = compare_profiles(&[faster, slower], &avg_time);
        assert_eq!(results[0].hot_methods.len(), TOP_N_HOT_METHODS);
    }
}
