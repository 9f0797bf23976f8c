use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use perffuzz_analyzer::{AnalyzerConfig, SignificanceLevel, analyze, are_interesting, overall_score};
use perffuzz_contracts::{AnomalyRecord, AnomalyRepository, MutationStrategy, RuntimeExecutor, RuntimeTarget};
use perffuzz_metrics::{PerformanceMetrics, Seed, SeedId};
use perffuzz_seedpool::SeedPool;
use perffuzz_selector::AdaptiveMutationSelector;
use perffuzz_verifier::Verifier;

#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    #[error("seed pool is empty and has no initial seeds to revive")]
    PoolExhausted,
    #[error("no mutation strategies are registered")]
    NoStrategies,
    #[error("mutation strategy index {0} has no matching RuntimeExecutor-facing strategy")]
    StrategyMismatch(usize),
    #[error("runtime execution failed: {0}")]
    Execution(#[from] perffuzz_contracts::ExecutionError),
}

/// What one loop iteration accomplished, for the harness to log.
#[derive(Debug, Clone)]
pub struct IterationOutcome {
    pub iteration: u64,
    pub parent_id: SeedId,
    pub strategy: String,
    pub child_accepted: bool,
    pub child_interestingness: f64,
    pub candidates_queued: usize,
    pub confirmed_this_batch: usize,
}

/// Wires the seed pool, selector, analyzer, and verifier into the iteration:
/// select seed, select strategy, mutate, execute across every runtime,
/// analyze, score and admit the child, track stagnation, and batch-confirm
/// once the queue is large enough.
pub struct FuzzerLoop {
    pool: SeedPool,
    selector: AdaptiveMutationSelector,
    strategies: Vec<Box<dyn MutationStrategy>>,
    executors: Vec<(RuntimeTarget, Arc<dyn RuntimeExecutor>)>,
    analyzer_config: AnalyzerConfig,
    verifier: Verifier,
    repository: Box<dyn AnomalyRepository>,
    candidate_queue: Vec<(SeedId, perffuzz_metrics::AnomalyGroup)>,
    iteration: u64,
    stagnation_threshold: u64,
    iterations_without_new_seed: u64,
}

impl FuzzerLoop {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: SeedPool,
        selector: AdaptiveMutationSelector,
        strategies: Vec<Box<dyn MutationStrategy>>,
        executors: Vec<(RuntimeTarget, Arc<dyn RuntimeExecutor>)>,
        analyzer_config: AnalyzerConfig,
        verifier: Verifier,
        repository: Box<dyn AnomalyRepository>,
        stagnation_threshold: u64,
    ) -> Self {
        Self {
            pool,
            selector,
            strategies,
            executors,
            analyzer_config,
            verifier,
            repository,
            candidate_queue: Vec::new(),
            iteration: 0,
            stagnation_threshold,
            iterations_without_new_seed: 0,
        }
    }

    #[must_use]
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    #[must_use]
    pub fn pool(&self) -> &SeedPool {
        &self.pool
    }

    /// `true` once `iterations_without_new_seed` reaches the configured
    /// `stagnation_threshold` — the second half of the loop's termination
    /// condition, alongside the caller's own `max_iterations` cap.
    #[must_use]
    pub fn is_stagnated(&self) -> bool {
        self.iterations_without_new_seed >= self.stagnation_threshold
    }

    /// Run one full iteration of the loop, returning `Ok(None)` if the
    /// pool has nothing left to mutate (campaign should stop).
    pub fn step(&mut self) -> Result<Option<IterationOutcome>, LoopError> {
        // 1. select a seed to mutate
        let Some(parent_id) = self.pool.select() else {
            return Ok(None);
        };
        let parent = self.pool.get(parent_id).expect("select() returns a live id").clone();

        // 2. select a mutation strategy
        if self.strategies.is_empty() {
            return Err(LoopError::NoStrategies);
        }
        let strategy_idx = self.selector.select().ok_or(LoopError::NoStrategies)?;
        let strategy = self
            .strategies
            .get(strategy_idx)
            .ok_or(LoopError::StrategyMismatch(strategy_idx))?;
        let strategy_name = strategy.name().to_string();

        // 3. apply the mutation
        self.selector.notify_applied(strategy_idx);
        let child_bytes = match strategy.mutate(&parent.artifact, self.iteration) {
            Ok(bytes) => bytes,
            Err(_) => {
                self.selector.notify_seed_rejected(strategy_idx);
                self.pool.decrement(parent_id);
                self.iteration += 1;
                self.iterations_without_new_seed += 1;
                return Ok(Some(IterationOutcome {
                    iteration: self.iteration,
                    parent_id,
                    strategy: strategy_name,
                    child_accepted: false,
                    child_interestingness: 0.0,
                    candidates_queued: self.candidate_queue.len(),
                    confirmed_this_batch: 0,
                }));
            }
        };

        // 4. execute across every configured runtime
        let mut metrics: BTreeMap<String, PerformanceMetrics> = BTreeMap::new();
        for (target, executor) in &self.executors {
            let m = executor.execute(target, &child_bytes)?;
            metrics.insert(target.label.clone(), m);
        }

        // 5. analyze
        let groups = analyze(&metrics, SignificanceLevel::SeedEvolution, self.analyzer_config);

        // 6. score and admit
        let interesting = are_interesting(&groups);
        let score = overall_score(&groups);
        let mut accepted = false;
        if interesting {
            let timestamp = now_unix();
            let child = Seed::child(
                &parent,
                child_bytes,
                strategy.name(),
                timestamp,
                groups.clone(),
                score,
                self.iteration,
                parent.energy,
            );
            let child_id = child.id();
            accepted = self.pool.add(child);
            if accepted {
                self.selector.notify_new_seed_generated(strategy_idx, true);
                for group in &groups {
                    self.candidate_queue.push((child_id, group.clone()));
                }
            } else {
                self.selector.notify_seed_rejected(strategy_idx);
            }
        } else {
            self.selector.notify_seed_rejected(strategy_idx);
        }
        self.pool.decrement(parent_id);

        // 7. reset stagnation on accept, else count another unproductive
        // iteration
        if accepted {
            self.iterations_without_new_seed = 0;
        } else {
            self.iterations_without_new_seed += 1;
        }

        // 8. batch-confirm once the candidate queue is large enough
        let mut confirmed_this_batch = 0;
        if self.verifier.should_perform_batch(self.candidate_queue.len()) {
            confirmed_this_batch = self.run_verification_batch()?;
        }

        // 9. advance
        self.iteration += 1;

        Ok(Some(IterationOutcome {
            iteration: self.iteration,
            parent_id,
            strategy: strategy_name,
            child_accepted: accepted,
            child_interestingness: score,
            candidates_queued: self.candidate_queue.len(),
            confirmed_this_batch,
        }))
    }

    fn run_verification_batch(&mut self) -> Result<usize, LoopError> {
        let mut ranked = self.candidate_queue.clone();
        ranked.sort_by(|a, b| {
            b.1.interestingness
                .partial_cmp(&a.1.interestingness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(self.verifier.top_n());

        let mut confirmed_count = 0;
        for (seed_id, group) in &ranked {
            let remeasurement = self.rerun_for_confirmation(*seed_id)?;
            let verified = self.verifier.confirm(group, remeasurement);
            if let Some(seed) = self.pool.get_mut(*seed_id) {
                seed.apply_confirmation(verified.confirmed, verified.anomalies.clone(), verified.interestingness);
            }
            if verified.confirmed {
                confirmed_count += 1;
                let record = AnomalyRecord {
                    seed_id: format!("{seed_id:?}"),
                    groups: verified.anomalies.clone(),
                };
                let _ = self.repository.store(&record);
            }
        }
        self.candidate_queue.clear();
        Ok(confirmed_count)
    }

    /// Re-materialize and remeasure a seed once at REPORTING significance —
    /// the "heavier harness settings" confirmation pass (spec §4.5 steps
    /// 1-3); the resulting anomaly list already only contains groups that
    /// meet that significance level.
    fn rerun_for_confirmation(&self, seed_id: SeedId) -> Result<Vec<perffuzz_metrics::AnomalyGroup>, LoopError> {
        let Some(seed) = self.pool.get(seed_id) else {
            return Ok(Vec::new());
        };
        let mut metrics: BTreeMap<String, PerformanceMetrics> = BTreeMap::new();
        for (target, executor) in &self.executors {
            let m = executor.execute(target, &seed.artifact)?;
            metrics.insert(target.label.clone(), m);
        }
        Ok(analyze(&metrics, SignificanceLevel::Reporting, self.analyzer_config))
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
