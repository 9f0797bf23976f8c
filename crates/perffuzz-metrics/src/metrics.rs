//! Per-run measurement of one runtime executing one seed.
//!
//! Modeled as a sum type rather than a flat struct with sentinel fields
//! (see Design Notes in the spec this crate implements): a run either timed
//! out, exited abnormally or produced an unparsable result file, or
//! completed and parsed cleanly. Only the `Ok` variant carries score-bearing
//! fields, so a caller can never accidentally consume a sentinel value from
//! a failed run.

use std::path::PathBuf;

/// Exit-code sentinel used for a forcefully terminated, timed-out child.
pub const TIMEOUT_EXIT_CODE: i32 = -100;

/// One runtime's outcome for one execution of one seed.
#[derive(Debug, Clone, PartialEq)]
pub enum PerformanceMetrics {
    /// The child process was killed after exceeding its wall-clock budget.
    TimedOut { exit_code: i32 },
    /// The child exited, but produced no usable result (non-zero exit,
    /// missing result file, or a result file that failed to parse).
    ParseFailure { exit_code: i32 },
    /// A clean, parsed measurement.
    Ok {
        /// Central tendency (mean) of the measured score, e.g. ns/op.
        score: f64,
        /// Half-width of the reported confidence interval.
        error: f64,
        min: f64,
        max: f64,
        /// Peak resident memory in KiB, when the harness reported one.
        memory_kb: Option<u64>,
        /// Path to the raw report file backing this measurement.
        report_path: PathBuf,
    },
}

impl PerformanceMetrics {
    /// True if this run was killed on the timeout path.
    #[must_use]
    pub const fn timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// True if the run produced a usable, parsed measurement.
    #[must_use]
    pub const fn parse_success(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The child's exit code, when one was observed.
    ///
    /// `Ok` runs don't carry an explicit exit code field (a successful run
    /// is definitionally exit code 0 by the harness contract), so this
    /// returns `Some(0)` for them.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::TimedOut { exit_code } | Self::ParseFailure { exit_code } => *exit_code,
            Self::Ok { .. } => 0,
        }
    }

    /// Central score, only meaningful for `Ok`.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Ok { score, .. } => Some(*score),
            _ => None,
        }
    }

    /// Reported confidence-interval half-width, only meaningful for `Ok`.
    #[must_use]
    pub fn error(&self) -> Option<f64> {
        match self {
            Self::Ok { error, .. } => Some(*error),
            _ => None,
        }
    }

    /// Peak memory sample in KiB, only meaningful for `Ok`.
    #[must_use]
    pub fn memory_kb(&self) -> Option<u64> {
        match self {
            Self::Ok { memory_kb, .. } => *memory_kb,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_out_implies_not_parsed() {
        let m = PerformanceMetrics::TimedOut {
            exit_code: TIMEOUT_EXIT_CODE,
        };
        assert!(m.timed_out());
        assert!(!m.parse_success());
    }

    #[test]
    fn ok_is_parsed_and_not_timed_out() {
        let m = PerformanceMetrics::Ok {
            score: 100.0,
            error: 2.0,
            min: 95.0,
            max: 105.0,
            memory_kb: Some(1024),
            report_path: PathBuf::from("/tmp/report.json"),
        };
        assert!(m.parse_success());
        assert!(!m.timed_out());
        assert_eq!(m.score(), Some(100.0));
    }

    #[test]
    fn parse_failure_carries_exit_code() {
        let m = PerformanceMetrics::ParseFailure { exit_code: 134 };
        assert!(!m.parse_success());
        assert!(!m.timed_out());
        assert_eq!(m.exit_code(), 134);
    }
}
