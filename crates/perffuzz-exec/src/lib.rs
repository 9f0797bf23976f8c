//! Reference [`RuntimeExecutor`]: spawns the runtime's own benchmark
//! driver as a child process, drains its pipes on dedicated threads so a
//! chatty runtime can't deadlock on a full stdout/stderr buffer, and kills
//! it if it outlives its configured timeout.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;

use perffuzz_contracts::{BenchmarkHarness, BenchmarkHarnessError, ExecutionError, ProgramUnit, RuntimeExecutor, RuntimeTarget};
use perffuzz_metrics::{PerformanceMetrics, TIMEOUT_EXIT_CODE};

/// On-disk shape of the report file a runtime driver writes after a run.
#[derive(Debug, Deserialize)]
struct ReportFile {
    score: f64,
    error: f64,
    min: f64,
    max: f64,
    memory_kb: Option<u64>,
}

/// Runs each target by writing the program unit to a scratch file under
/// `work_dir`, invoking `target.command` with `target.args` followed by
/// the program path and a report-file path, and polling for completion.
pub struct ProcessExecutor {
    work_dir: PathBuf,
    poll_interval: Duration,
}

impl ProcessExecutor {
    #[must_use]
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            poll_interval: Duration::from_millis(10),
        }
    }

    fn scratch_paths(&self, label: &str) -> (PathBuf, PathBuf) {
        let stamp = std::process::id();
        (
            self.work_dir.join(format!("{label}-{stamp}.program")),
            self.work_dir.join(format!("{label}-{stamp}.report.json")),
        )
    }

    fn drain_pipes(child: &mut Child) -> (thread::JoinHandle<String>, thread::JoinHandle<String>) {
        let mut stdout = child.stdout.take().expect("stdout was piped");
        let mut stderr = child.stderr.take().expect("stderr was piped");
        let out = thread::spawn(move || {
            let mut buf = String::new();
            let _ = stdout.read_to_string(&mut buf);
            buf
        });
        let err = thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        });
        (out, err)
    }

    fn wait_with_timeout(&self, mut child: Child, timeout: Duration) -> Result<Option<i32>, std::io::Error> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status.code().or(Some(-1)));
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl RuntimeExecutor for ProcessExecutor {
    fn execute(&self, target: &RuntimeTarget, program: &[u8]) -> Result<PerformanceMetrics, ExecutionError> {
        let (program_path, report_path) = self.scratch_paths(&target.label);
        fs::write(&program_path, program).map_err(|source| ExecutionError::Spawn {
            label: target.label.clone(),
            source,
        })?;

        let mut command = Command::new(&target.command);
        command
            .args(&target.args)
            .arg(&program_path)
            .arg(&report_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| ExecutionError::Spawn {
            label: target.label.clone(),
            source,
        })?;
        let (stdout_handle, stderr_handle) = Self::drain_pipes(&mut child);

        let timeout = Duration::from_millis(target.timeout_ms);
        let wait_result = self
            .wait_with_timeout(child, timeout)
            .map_err(|source| ExecutionError::Spawn {
                label: target.label.clone(),
                source,
            })?;
        let _ = stdout_handle.join();
        let _ = stderr_handle.join();

        let Some(exit_code) = wait_result else {
            let _ = fs::remove_file(&program_path);
            let _ = fs::remove_file(&report_path);
            return Ok(PerformanceMetrics::TimedOut {
                exit_code: TIMEOUT_EXIT_CODE,
            });
        };

        let metrics = load_report(&report_path, exit_code);
        let _ = fs::remove_file(&program_path);
        let _ = fs::remove_file(&report_path);
        Ok(metrics)
    }
}

/// Reference [`BenchmarkHarness`]: writes the program unit's bytes verbatim
/// to a fixed wrapper path under `out_dir` and returns that path. Does not
/// invoke a real compiler — the real per-runtime harness generators named
/// out of scope are the production implementations of this contract.
pub struct TemplateBenchmarkHarness {
    out_dir: PathBuf,
}

impl TemplateBenchmarkHarness {
    #[must_use]
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl BenchmarkHarness for TemplateBenchmarkHarness {
    fn prepare(&self, unit: &ProgramUnit) -> Result<PathBuf, BenchmarkHarnessError> {
        let wrapper_path = self.out_dir.join(format!("{}.wrapper", unit.description));
        fs::write(&wrapper_path, &unit.bytes).map_err(|e| BenchmarkHarnessError::Write {
            unit: unit.description.clone(),
            reason: e.to_string(),
        })?;
        Ok(wrapper_path)
    }
}

fn load_report(report_path: &Path, exit_code: i32) -> PerformanceMetrics {
    if exit_code != 0 {
        return PerformanceMetrics::ParseFailure { exit_code };
    }
    let Ok(raw) = fs::read_to_string(report_path) else {
        return PerformanceMetrics::ParseFailure { exit_code };
    };
    let Ok(report) = serde_json::from_str::<ReportFile>(&raw) else {
        return PerformanceMetrics::ParseFailure { exit_code };
    };
    PerformanceMetrics::Ok {
        score: report.score,
        error: report.error,
        min: report.min,
        max: report.max,
        memory_kb: report.memory_kb,
        report_path: report_path.to_path_buf(),
    }
}
