use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use parking_lot::Mutex;

use perffuzz_contracts::{AnomalyRecord, AnomalyRepository, RepositoryError};

/// Append-only JSONL sink: one [`AnomalyRecord`] per line.
///
/// Guarded by a [`parking_lot::Mutex`] rather than `std::sync::Mutex` so the
/// CLI's `report` subcommand can take the same lock the running campaign
/// holds without dealing with lock poisoning on a panicking writer.
pub struct FileRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileRepository {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredRecord {
    seed_id: String,
    groups: Vec<perffuzz_metrics::AnomalyGroup>,
}

impl AnomalyRepository for FileRepository {
    fn store(&self, record: &AnomalyRecord) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock();
        let stored = StoredRecord {
            seed_id: record.seed_id.clone(),
            groups: record.groups.clone(),
        };
        let line = serde_json::to_string(&stored).map_err(|e| RepositoryError::Write(e.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RepositoryError::Write(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| RepositoryError::Write(e.to_string()))?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<AnomalyRecord>, RepositoryError> {
        let _guard = self.lock.lock();
        let Ok(file) = std::fs::File::open(&self.path) else {
            return Ok(Vec::new());
        };
        let reader = BufReader::new(file);
        let mut out = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| RepositoryError::Read(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let stored: StoredRecord = serde_json::from_str(&line).map_err(|e| RepositoryError::Read(e.to_string()))?;
            out.push(AnomalyRecord {
                seed_id: stored.seed_id,
                groups: stored.groups,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn record() -> AnomalyRecord {
        AnomalyRecord {
            seed_id: "abc".to_string(),
            groups: vec![perffuzz_metrics::AnomalyGroup {
                kind: perffuzz_metrics::AnomalyKind::Time,
                faster: BTreeSet::new(),
                slower: BTreeSet::new(),
                avg_deviation: 10.0,
                max_deviation: 10.0,
                min_deviation: 10.0,
                pairwise_deviation: BTreeMap::new(),
                description: "slow".to_string(),
                interestingness: 3.0,
                exit_codes: None,
                compiler_profile: None,
            }],
        }
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path().join("anomalies.jsonl"));
        repo.store(&record()).unwrap();
        repo.store(&record()).unwrap();
        let loaded = repo.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].seed_id, "abc");
    }

    #[test]
    fn loading_a_missing_file_is_an_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path().join("missing.jsonl"));
        assert!(repo.load_all().unwrap().is_empty());
    }
}
