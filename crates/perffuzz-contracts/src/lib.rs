//! Traits at the external boundary: running a compiled unit under a
//! runtime, applying a mutation strategy, parsing a runtime's compilation
//! log, and persisting confirmed anomalies.

mod benchmark;
pub mod harness_report;
mod ir;
mod mutation;
mod repository;
mod runtime;

pub use benchmark::{BenchmarkHarness, BenchmarkHarnessError};
pub use ir::{IrError, IrTranslator, ProgramUnit};
pub use mutation::{MutationError, MutationStrategy};
pub use repository::{AnomalyRecord, AnomalyRepository, RepositoryError};
pub use runtime::{CompilationLogParser, ExecutionError, RuntimeExecutor, RuntimeTarget};
