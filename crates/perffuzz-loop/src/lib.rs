//! Orchestrates one fuzzing campaign: loads configuration, owns the seed
//! pool/selector/verifier, and drives the iteration loop.

mod config;
mod iteration;
mod repository;

pub use config::{
    AnalyzerConfigToml, Config, ConfigError, PoolConfigToml, RuntimeTargetConfig, SelectorConfigToml,
    SignificanceLevelConfig, VerifierConfigToml,
};
pub use iteration::{FuzzerLoop, IterationOutcome, LoopError};
pub use repository::FileRepository;
