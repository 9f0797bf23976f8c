//! The line-oriented result format a [`crate::BenchmarkHarness`]'s wrapper
//! writes and a [`crate::RuntimeExecutor`] reads back after running it.
//!
//! One `KEY: value` pair per line; unknown keys are ignored so the format
//! can grow without breaking older parsers.

/// A parsed benchmark result file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarnessReport {
    pub score_ns: f64,
    pub memory_kb: Option<u64>,
}

/// Parse a report written in the `AVERAGE_SCORE_NS:` / `AVERAGE_MEMORY_USAGE_KB:`
/// line format. Returns `None` if the mandatory score line is absent or
/// unparsable.
#[must_use]
pub fn parse(text: &str) -> Option<HarnessReport> {
    let mut score_ns = None;
    let mut memory_kb = None;
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "AVERAGE_SCORE_NS" => score_ns = value.trim().parse::<f64>().ok(),
            "AVERAGE_MEMORY_USAGE_KB" => memory_kb = value.trim().parse::<u64>().ok(),
            _ => {}
        }
    }
    Some(HarnessReport {
        score_ns: score_ns?,
        memory_kb,
    })
}

/// Render a report back into the same line format, for the reference
/// [`crate::BenchmarkHarness`] and tests.
#[must_use]
pub fn render(report: &HarnessReport) -> String {
    let mut out = format!("AVERAGE_SCORE_NS: {}\n", report.score_ns);
    if let Some(kb) = report.memory_kb {
        out.push_str(&format!("AVERAGE_MEMORY_USAGE_KB: {kb}\n"));
    }
    out
}
