//! Data model for the differential performance fuzzer.
//!
//! This crate owns the value types shared by every other `perffuzz-*` crate:
//! per-run measurements, classified anomalies, compilation profiles, and the
//! seed entity the evolutionary loop mutates. Nothing here performs I/O or
//! spawns processes — it is pure data plus the small amount of arithmetic
//! needed to keep invariants (seed identity, aggregate computation) local to
//! the type that owns them.

#![deny(unsafe_code)]

pub mod anomaly;
pub mod metrics;
pub mod profile;
pub mod seed;

pub use anomaly::{AnomalyGroup, AnomalyKind};
pub use metrics::{PerformanceMetrics, TIMEOUT_EXIT_CODE};
pub use profile::{CompilationEvent, CompilationProfile, ComparisonResult, HotMethodAnalysis};
pub use seed::{MutationRecord, Seed, SeedId};
