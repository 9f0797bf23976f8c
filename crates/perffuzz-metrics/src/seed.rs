//! The candidate entity the evolutionary loop mutates, measures, and scores.

use crate::anomaly::AnomalyGroup;

/// One step of a seed's mutation lineage.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub parent_description: String,
    pub strategy_name: String,
    /// Unix seconds. Threaded in by the caller rather than sampled here, so
    /// seed construction stays a pure function of its inputs.
    pub timestamp: i64,
}

/// Content-addressed identity for a seed: two seeds with equal artifact
/// bytes are the same seed, regardless of lineage or scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeedId {
    len: usize,
    hash: [u8; 32],
}

impl SeedId {
    #[must_use]
    pub fn of(artifact: &[u8]) -> Self {
        let hash = *blake3::hash(artifact).as_bytes();
        Self {
            len: artifact.len(),
            hash,
        }
    }
}

/// A single compiled program unit under evolutionary search, plus the
/// evidence and bookkeeping the loop needs to select, mutate, and retire it.
#[derive(Debug, Clone)]
pub struct Seed {
    pub artifact: Vec<u8>,
    pub class_name: String,
    pub package: String,
    pub mutations: Vec<MutationRecord>,
    pub anomalies: Vec<AnomalyGroup>,
    pub energy: u32,
    pub interestingness: f64,
    pub verified: bool,
    /// True for seeds present in the initial corpus at start-up; these are
    /// never evicted and are the revival target population.
    pub initial: bool,
    /// Iteration number at which this seed was accepted into the pool.
    pub created_at_iteration: u64,
}

impl Seed {
    /// Build a fresh initial-corpus seed with the given starting energy.
    #[must_use]
    pub fn initial(artifact: Vec<u8>, class_name: impl Into<String>, package: impl Into<String>, energy: u32) -> Self {
        Self {
            artifact,
            class_name: class_name.into(),
            package: package.into(),
            mutations: Vec::new(),
            anomalies: Vec::new(),
            energy,
            interestingness: 0.0,
            verified: false,
            initial: true,
            created_at_iteration: 0,
        }
    }

    /// Build a child seed inheriting lineage from a mutation of `parent`.
    #[must_use]
    pub fn child(
        parent: &Seed,
        artifact: Vec<u8>,
        strategy_name: impl Into<String>,
        timestamp: i64,
        anomalies: Vec<AnomalyGroup>,
        interestingness: f64,
        iteration: u64,
        energy: u32,
    ) -> Self {
        let mut mutations = parent.mutations.clone();
        mutations.push(MutationRecord {
            parent_description: parent.description(),
            strategy_name: strategy_name.into(),
            timestamp,
        });
        Self {
            artifact,
            class_name: parent.class_name.clone(),
            package: parent.package.clone(),
            mutations,
            anomalies,
            energy,
            interestingness,
            verified: false,
            initial: false,
            created_at_iteration: iteration,
        }
    }

    /// Content-addressed identity of this seed.
    #[must_use]
    pub fn id(&self) -> SeedId {
        SeedId::of(&self.artifact)
    }

    /// Human-readable description derived from the current anomaly set.
    #[must_use]
    pub fn description(&self) -> String {
        if self.anomalies.is_empty() {
            return format!("{}.{}: no anomalies", self.package, self.class_name);
        }
        let kinds: Vec<String> = self
            .anomalies
            .iter()
            .map(|a| format!("{:?}", a.kind))
            .collect();
        format!(
            "{}.{}: {} anomaly group(s) [{}]",
            self.package,
            self.class_name,
            self.anomalies.len(),
            kinds.join(", ")
        )
    }

    /// Decrement energy by one, clamped at zero.
    pub fn decrement_energy(&mut self) {
        self.energy = self.energy.saturating_sub(1);
    }

    /// Apply the outcome of a verifier rerun to this seed's own state. The
    /// verifier's confirmation result already decides what the new anomaly
    /// set and interestingness are (the fresh remeasurement on reproduction,
    /// the dampened/floored prior value on failure) — this just writes them
    /// through along with the `verified` flag.
    pub fn apply_confirmation(&mut self, confirmed: bool, new_anomalies: Vec<AnomalyGroup>, new_interestingness: f64) {
        self.verified = confirmed;
        self.anomalies = new_anomalies;
        self.interestingness = new_interestingness;
    }

    /// Eviction-order key: `energy * (1 + interestingness)`, ascending.
    #[must_use]
    pub fn eviction_key(&self) -> f64 {
        self.energy as f64 * (1.0 + self.interestingness)
    }
}
