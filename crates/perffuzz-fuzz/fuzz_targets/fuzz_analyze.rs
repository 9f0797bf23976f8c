#![no_main]
use std::collections::BTreeMap;
use std::path::PathBuf;

use libfuzzer_sys::fuzz_target;
use perffuzz_analyzer::{AnalyzerConfig, SignificanceLevel, analyze};
use perffuzz_metrics::PerformanceMetrics;

// Each 9-byte record becomes one runtime's outcome: a tag byte selecting
// TimedOut/ParseFailure/Ok, then score/error/spread as big-endian i16s
// scaled down, kept small so most inputs land near the analyzer's
// significance thresholds instead of always triggering the timeout path.
fn outcome_from(record: &[u8]) -> PerformanceMetrics {
    let tag = record[0] % 3;
    let score = i16::from_be_bytes([record[1], record[2]]) as f64 / 100.0;
    let error = (i16::from_be_bytes([record[3], record[4]]).unsigned_abs() as f64) / 1000.0;
    let spread = (i16::from_be_bytes([record[5], record[6]]).unsigned_abs() as f64) / 1000.0;
    let memory_kb = u16::from_be_bytes([record[7], record[8]]);

    match tag {
        0 => PerformanceMetrics::TimedOut { exit_code: -100 },
        1 => PerformanceMetrics::ParseFailure { exit_code: record[1] as i32 },
        _ => PerformanceMetrics::Ok {
            score,
            error,
            min: score - spread,
            max: score + spread,
            memory_kb: Some(memory_kb as u64),
            report_path: PathBuf::from("fuzz-report.json"),
        },
    }
}

// analyze() must never panic for any byte input: empty maps, one runtime,
// every runtime timing out, or a runtime count beyond any real campaign.
fuzz_target!(|data: &[u8]| {
    const RECORD_LEN: usize = 9;
    let mut metrics: BTreeMap<String, PerformanceMetrics> = BTreeMap::new();
    for (i, record) in data.chunks_exact(RECORD_LEN).take(64).enumerate() {
        metrics.insert(format!("runtime-{i}"), outcome_from(record));
    }

    let level = if data.first().is_some_and(|b| b % 2 == 0) {
        SignificanceLevel::SeedEvolution
    } else {
        SignificanceLevel::Reporting
    };

    let _ = analyze(&metrics, level, AnalyzerConfig::default());
});
