use std::path::PathBuf;

use thiserror::Error;

use crate::ir::ProgramUnit;

#[derive(Debug, Error)]
pub enum BenchmarkHarnessError {
    #[error("failed to materialize benchmark wrapper for {unit}: {reason}")]
    Write { unit: String, reason: String },
}

/// Compiles (or, for a reference implementation, materializes a fixed
/// template around) the microbenchmark wrapper for one program unit, and
/// reports the path to the resulting artifact a [`crate::RuntimeExecutor`]
/// can invoke.
pub trait BenchmarkHarness: Send + Sync {
    /// # Errors
    /// Returns [`BenchmarkHarnessError`] if the wrapper could not be written.
    fn prepare(&self, unit: &ProgramUnit) -> Result<PathBuf, BenchmarkHarnessError>;
}
