//! Integration test: the on-disk logging path a real campaign run uses.
//!
//! The unit tests in `structured_log.rs` only exercise `LogEmitter::to_buffer`;
//! this drives `LogEmitter::to_file` against a real temp file and reads the
//! JSONL back, and checks every strategy name a [`perffuzz_loop::Config`]
//! can reference actually resolves.

use perffuzz_harness::strategies;
use perffuzz_harness::structured_log::{LogEmitter, LogEntry, LogLevel};

#[test]
fn file_backed_emitter_round_trips_jsonl_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("campaign.jsonl");

    {
        let mut emitter = LogEmitter::to_file(&log_path, "campaign-test").unwrap();
        for i in 0..5u64 {
            let entry = LogEntry::new("", LogLevel::Info, "iteration")
                .with_iteration(i)
                .with_strategy("havoc")
                .with_interestingness(i as f64 * 1.5);
            emitter.emit(entry).unwrap();
        }
        emitter.flush().unwrap();
    }

    let contents = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 5);

    for (i, line) in lines.iter().enumerate() {
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["iteration"], i as u64);
        assert_eq!(parsed["trace_id"], format!("campaign-test::{:05}", i + 1));
    }
}

#[test]
fn every_built_in_strategy_name_resolves() {
    for name in ["splice", "havoc", "arith"] {
        assert!(strategies::resolve(name).is_some(), "{name} should resolve to a built-in strategy");
    }
    assert!(strategies::resolve("not-a-real-strategy").is_none());
}
