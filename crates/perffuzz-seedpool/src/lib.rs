//! Energy/interestingness-weighted seed pool: add, dedup, select, decay,
//! revive, evict.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use perffuzz_metrics::{Seed, SeedId};

const EXPLORATION_PROBABILITY: f64 = 0.1;

/// Tunable pool parameters.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_size: usize,
    pub min_energy: u32,
    pub energy_boost: u32,
    pub initial_energy: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 512,
            min_energy: 1,
            energy_boost: 5,
            initial_energy: 10,
        }
    }
}

/// The live seed population plus the frozen initial corpus kept for
/// revival.
pub struct SeedPool {
    config: PoolConfig,
    live: Vec<Seed>,
    initial: Vec<Seed>,
    rng: StdRng,
}

impl SeedPool {
    #[must_use]
    pub fn new(initial_seeds: Vec<Seed>, config: PoolConfig, rng_seed: u64) -> Self {
        Self {
            config,
            live: initial_seeds.clone(),
            initial: initial_seeds,
            rng: StdRng::seed_from_u64(rng_seed),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: SeedId) -> Option<&Seed> {
        self.live.iter().find(|s| s.id() == id)
    }

    /// Mutable access for post-confirmation bookkeeping (dampening a
    /// seed's interestingness, recording its verified status).
    pub fn get_mut(&mut self, id: SeedId) -> Option<&mut Seed> {
        self.live.iter_mut().find(|s| s.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seed> {
        self.live.iter()
    }

    fn contains(&self, id: SeedId) -> bool {
        self.live.iter().any(|s| s.id() == id)
    }

    /// Reject if an artifact-equal seed already exists; otherwise insert
    /// and evict if the pool now exceeds its configured cap.
    pub fn add(&mut self, seed: Seed) -> bool {
        if self.contains(seed.id()) {
            return false;
        }
        self.live.push(seed);
        if self.live.len() > self.config.max_size {
            self.evict();
        }
        true
    }

    /// Two-pass eviction: unverified non-initial seeds first, by ascending
    /// `energy * (1 + interestingness)`, then verified non-initial seeds by
    /// the same order. Initial seeds are never evicted.
    fn evict(&mut self) {
        while self.live.len() > self.config.max_size {
            if !self.evict_one(|s| !s.verified && !s.initial) && !self.evict_one(|s| s.verified && !s.initial) {
                break;
            }
        }
    }

    fn evict_one(&mut self, predicate: impl Fn(&Seed) -> bool) -> bool {
        let victim = self
            .live
            .iter()
            .enumerate()
            .filter(|(_, s)| predicate(s))
            .min_by(|(_, a), (_, b)| {
                a.eviction_key()
                    .partial_cmp(&b.eviction_key())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i);
        match victim {
            Some(i) => {
                self.live.remove(i);
                true
            }
            None => false,
        }
    }

    /// Select a seed to mutate, running revival first if nothing in the
    /// pool has positive energy.
    pub fn select(&mut self) -> Option<SeedId> {
        if self.live.is_empty() {
            return None;
        }
        if !self.live.iter().any(|s| s.energy > 0) {
            self.revive();
        }
        self.live.retain(|s| s.energy > 0 || s.verified || s.initial);
        if self.live.is_empty() {
            self.restore_initial();
        }
        if self.live.is_empty() {
            return None;
        }

        let total_energy: u64 = self.live.iter().map(|s| u64::from(s.energy)).sum();
        if (total_energy as usize) < self.live.len() {
            let boost = self.config.energy_boost;
            for s in &mut self.live {
                s.energy += boost;
            }
        }

        let positive_idxs: Vec<usize> = self
            .live
            .iter()
            .enumerate()
            .filter(|(_, s)| s.energy > 0)
            .map(|(i, _)| i)
            .collect();
        if positive_idxs.is_empty() {
            return None;
        }

        if self.rng.r#gen::<f64>() < EXPLORATION_PROBABILITY {
            let idx = positive_idxs[self.rng.gen_range(0..positive_idxs.len())];
            return Some(self.live[idx].id());
        }

        let weights: Vec<f64> = positive_idxs
            .iter()
            .map(|&i| {
                let s = &self.live[i];
                f64::from(s.energy) * if s.verified { 2.0 } else { 1.0 }
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            let idx = positive_idxs[self.rng.gen_range(0..positive_idxs.len())];
            return Some(self.live[idx].id());
        }
        let mut draw = self.rng.r#gen::<f64>() * total;
        for (k, &w) in weights.iter().enumerate() {
            draw -= w;
            if draw <= 0.0 {
                return Some(self.live[positive_idxs[k]].id());
            }
        }
        positive_idxs.last().map(|&i| self.live[i].id())
    }

    fn restore_initial(&mut self) {
        self.live = self.initial.clone();
        for s in &mut self.live {
            s.energy = self.config.initial_energy;
        }
    }

    /// Boost verified low-energy seeds, the highest-interestingness
    /// unverified low-energy seeds, and enough of the lowest-energy others
    /// to reach a target of `|initial|` positive-energy seeds; refresh any
    /// initial seed that fell below the energy threshold.
    fn revive(&mut self) {
        let target = self.initial.len().max(1);
        let min_energy = self.config.min_energy;
        let boost = self.config.energy_boost;

        for s in self.live.iter_mut().filter(|s| s.verified && s.energy <= min_energy) {
            s.energy += boost;
        }

        let mut positive = self.live.iter().filter(|s| s.energy > 0).count();
        if positive < target {
            let mut candidates: Vec<usize> = self
                .live
                .iter()
                .enumerate()
                .filter(|(_, s)| !s.verified && s.energy <= min_energy)
                .map(|(i, _)| i)
                .collect();
            candidates.sort_by(|&a, &b| {
                self.live[b]
                    .interestingness
                    .partial_cmp(&self.live[a].interestingness)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            for i in candidates {
                if positive >= target {
                    break;
                }
                if self.live[i].energy == 0 {
                    positive += 1;
                }
                self.live[i].energy += boost;
            }
        }

        if positive < target {
            let mut idxs: Vec<usize> = (0..self.live.len()).collect();
            idxs.sort_by_key(|&i| self.live[i].energy);
            for i in idxs {
                if positive >= target {
                    break;
                }
                if self.live[i].energy == 0 {
                    positive += 1;
                    self.live[i].energy += boost;
                }
            }
        }

        for s in self.live.iter_mut().filter(|s| s.initial && s.energy < min_energy) {
            s.energy = self.config.initial_energy;
        }
    }

    /// Clamp the selected seed's energy down by one.
    pub fn decrement(&mut self, id: SeedId) {
        if let Some(s) = self.live.iter_mut().find(|s| s.id() == id) {
            s.decrement_energy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(bytes: &[u8], energy: u32) -> Seed {
        Seed::initial(bytes.to_vec(), "Main", "pkg", energy)
    }

    #[test]
    fn duplicate_artifact_is_rejected() {
        let mut pool = SeedPool::new(vec![seed(b"a", 10)], PoolConfig::default(), 1);
        assert!(!pool.add(seed(b"a", 5)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn distinct_artifact_is_accepted() {
        let mut pool = SeedPool::new(vec![seed(b"a", 10)], PoolConfig::default(), 1);
        assert!(pool.add(seed(b"b", 5)));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn select_from_empty_pool_returns_none() {
        let mut pool = SeedPool::new(vec![], PoolConfig::default(), 1);
        assert_eq!(pool.select(), None);
    }

    #[test]
    fn select_with_only_zero_energy_seeds_triggers_revival() {
        let mut pool = SeedPool::new(vec![seed(b"a", 0)], PoolConfig::default(), 42);
        let picked = pool.select();
        assert!(picked.is_some());
        assert!(pool.iter().any(|s| s.energy > 0));
    }

    #[test]
    fn initial_seeds_are_never_evicted() {
        let config = PoolConfig {
            max_size: 1,
            ..PoolConfig::default()
        };
        let mut pool = SeedPool::new(vec![seed(b"initial", 10)], config, 1);
        pool.add(seed(b"child", 1));
        assert!(pool.get(Seed::initial(b"initial".to_vec(), "x", "y", 0).id()).is_some());
    }

    #[test]
    fn decrement_clamps_at_zero() {
        let mut pool = SeedPool::new(vec![seed(b"a", 0)], PoolConfig::default(), 1);
        let id = pool.get(seed(b"a", 0).id()).unwrap().id();
        pool.decrement(id);
        assert_eq!(pool.get(id).unwrap().energy, 0);
    }
}
