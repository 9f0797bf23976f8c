use perffuzz_metrics::{CompilationProfile, PerformanceMetrics};

/// One runtime under test: a label plus how to invoke it.
#[derive(Debug, Clone)]
pub struct RuntimeTarget {
    pub label: String,
    pub command: String,
    pub args: Vec<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("failed to spawn {label}: {source}")]
    Spawn { label: String, source: std::io::Error },
    #[error("{label} exceeded its timeout of {timeout_ms}ms")]
    Timeout { label: String, timeout_ms: u64 },
    #[error("failed to parse compilation log for {label}: {reason}")]
    LogParse { label: String, reason: String },
}

/// Runs one compiled program unit under one runtime and reports what
/// happened: normal completion with a score, a parse failure, or a
/// timeout sentinel. Implementors own the process lifecycle; the trait
/// only promises a [`PerformanceMetrics`] back.
pub trait RuntimeExecutor: Send + Sync {
    fn execute(&self, target: &RuntimeTarget, program: &[u8]) -> Result<PerformanceMetrics, ExecutionError>;
}

/// Extracts a [`CompilationProfile`] from a runtime's raw JIT/compilation
/// log output (e.g. `-XX:+PrintCompilation`-style text).
pub trait CompilationLogParser: Send + Sync {
    fn parse(&self, label: &str, log: &str) -> Result<CompilationProfile, ExecutionError>;
}
