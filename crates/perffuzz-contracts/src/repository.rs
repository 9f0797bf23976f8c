use perffuzz_metrics::AnomalyGroup;

#[derive(Debug, Clone)]
pub struct AnomalyRecord {
    pub seed_id: String,
    pub groups: Vec<AnomalyGroup>,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("failed to persist anomaly record: {0}")]
    Write(String),
    #[error("failed to read stored anomaly records: {0}")]
    Read(String),
}

/// Durable sink for confirmed anomalies, decoupled from how the fuzzer
/// loop discovers them.
pub trait AnomalyRepository: Send + Sync {
    fn store(&self, record: &AnomalyRecord) -> Result<(), RepositoryError>;
    fn load_all(&self) -> Result<Vec<AnomalyRecord>, RepositoryError>;
}
