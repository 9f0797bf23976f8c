//! Adaptive Mutation Selector: a sigmoid-weighted multi-armed bandit over
//! named mutation strategies, with periodic decay so stale performance
//! estimates fade.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

const DEFAULT_EXPLORATION_FACTOR: f64 = 0.2;
const DEFAULT_FORGET_FREQUENCY: u64 = 250;
const DEFAULT_FORGET_FACTOR: f64 = 0.9;

/// Running counters for one mutation strategy. Kept as `f64` rather than
/// integers so periodic decay doesn't accumulate truncation bias over many
/// ticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyStats {
    pub applications: f64,
    pub successes: f64,
    pub seeds_generated: f64,
    pub anomalies_found: f64,
    pub failures: f64,
}

impl StrategyStats {
    /// `base = (0.2*successes + 0.5*seeds_generated + 1.0*anomalies_found - 0.1*failures) / applications`.
    fn raw_utility(self) -> f64 {
        let applications = self.applications.max(1.0);
        (0.2 * self.successes + 0.5 * self.seeds_generated + self.anomalies_found - 0.1 * self.failures) / applications
    }

    /// `weight = 0.1 + 0.9 / (1 + e^(-2*base))`, in `[0.1, 1)`. An untried
    /// strategy (`base == 0`) scores exactly `0.1`.
    #[must_use]
    pub fn score(self) -> f64 {
        0.1 + 0.9 * sigmoid(2.0 * self.raw_utility())
    }

    fn decay(&mut self, factor: f64) {
        self.applications *= factor;
        self.successes *= factor;
        self.seeds_generated *= factor;
        self.anomalies_found *= factor;
        self.failures *= factor;
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Tunable bandit parameters.
#[derive(Debug, Clone, Copy)]
pub struct SelectorConfig {
    pub exploration_factor: f64,
    pub forget_frequency: u64,
    pub forget_factor: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            exploration_factor: DEFAULT_EXPLORATION_FACTOR,
            forget_frequency: DEFAULT_FORGET_FREQUENCY,
            forget_factor: DEFAULT_FORGET_FACTOR,
        }
    }
}

/// Routes mutation decisions to the strategy with the best recent
/// track record, while still exploring the others.
pub struct AdaptiveMutationSelector {
    names: Vec<String>,
    stats: Vec<StrategyStats>,
    config: SelectorConfig,
    iterations: u64,
    rng: StdRng,
}

impl AdaptiveMutationSelector {
    #[must_use]
    pub fn new(strategy_names: Vec<String>, config: SelectorConfig, rng_seed: u64) -> Self {
        let stats = vec![StrategyStats::default(); strategy_names.len()];
        Self {
            names: strategy_names,
            stats,
            config,
            iterations: 0,
            rng: StdRng::seed_from_u64(rng_seed),
        }
    }

    #[must_use]
    pub fn stats(&self, index: usize) -> StrategyStats {
        self.stats[index]
    }

    #[must_use]
    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Pick a strategy index: with probability `exploration_factor`,
    /// uniformly at random; otherwise by sigmoid-score-weighted roulette.
    pub fn select(&mut self) -> Option<usize> {
        if self.names.is_empty() {
            return None;
        }
        if self.rng.r#gen::<f64>() < self.config.exploration_factor {
            return Some(self.rng.gen_range(0..self.names.len()));
        }
        let weights: Vec<f64> = self.stats.iter().map(|s| s.score()).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Some(self.rng.gen_range(0..self.names.len()));
        }
        let mut draw = self.rng.r#gen::<f64>() * total;
        for (i, &w) in weights.iter().enumerate() {
            draw -= w;
            if draw <= 0.0 {
                return Some(i);
            }
        }
        Some(self.names.len() - 1)
    }

    pub fn notify_applied(&mut self, index: usize) {
        self.stats[index].applications += 1.0;
        self.tick();
    }

    /// Record that this strategy's mutation produced a seed accepted into
    /// the pool, optionally flagging that it also surfaced a new anomaly.
    pub fn notify_new_seed_generated(&mut self, index: usize, found_anomaly: bool) {
        self.stats[index].successes += 1.0;
        self.stats[index].seeds_generated += 1.0;
        if found_anomaly {
            self.stats[index].anomalies_found += 1.0;
        }
    }

    pub fn notify_seed_rejected(&mut self, index: usize) {
        self.stats[index].failures += 1.0;
    }

    fn tick(&mut self) {
        self.iterations += 1;
        if self.iterations % self.config.forget_frequency == 0 {
            for s in &mut self.stats {
                s.decay(self.config.forget_factor);
            }
        }
    }
}
