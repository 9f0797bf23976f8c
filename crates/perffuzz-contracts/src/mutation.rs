#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("mutation strategy {strategy} rejected an empty seed")]
    EmptySeed { strategy: String },
    #[error("mutation strategy {strategy} failed: {reason}")]
    Failed { strategy: String, reason: String },
}

/// One way of deriving a child program unit from a parent seed's bytes.
/// Implementations are expected to be deterministic given `rng_seed`, so
/// mutation failures are reproducible.
pub trait MutationStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn mutate(&self, parent: &[u8], rng_seed: u64) -> Result<Vec<u8>, MutationError>;
}
