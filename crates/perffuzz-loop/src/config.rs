use std::path::Path;

use serde::{Deserialize, Serialize};

use perffuzz_analyzer::{AnalyzerConfig, SignificanceLevel};
use perffuzz_contracts::RuntimeTarget;
use perffuzz_seedpool::PoolConfig;
use perffuzz_selector::SelectorConfig;
use perffuzz_verifier::VerifierConfig;

/// Configuration-class errors: the TOML is malformed, or it's well-formed
/// but names a runtime that can never be launched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("runtime '{label}' has an empty executable command")]
    EmptyCommand { label: String },
    #[error("runtime '{label}' executable path does not exist: {command}")]
    MissingExecutable { label: String, command: String },
}

/// Full configuration surface for one fuzzing campaign, loadable from a
/// TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub runtimes: Vec<RuntimeTargetConfig>,
    pub strategies: Vec<String>,
    #[serde(default)]
    pub significance_level: SignificanceLevelConfig,
    #[serde(default)]
    pub pool: PoolConfigToml,
    #[serde(default)]
    pub selector: SelectorConfigToml,
    #[serde(default)]
    pub verifier: VerifierConfigToml,
    #[serde(default)]
    pub analyzer: AnalyzerConfigToml,
    pub max_iterations: u64,
    /// Stop early once this many consecutive iterations in a row have
    /// failed to admit a new seed into the pool.
    pub stagnation_threshold: u64,
    pub rng_seed: u64,
}

impl Config {
    /// Parses `raw` and fails fast if any runtime names an executable that
    /// is missing or (when given as a path rather than a bare `$PATH`
    /// lookup) does not exist on disk.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] if `raw` is not valid TOML for this
    /// schema, or [`ConfigError::EmptyCommand`] /
    /// [`ConfigError::MissingExecutable`] if a runtime's `command` is unusable.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for runtime in &self.runtimes {
            if runtime.command.trim().is_empty() {
                return Err(ConfigError::EmptyCommand {
                    label: runtime.label.clone(),
                });
            }
            // A bare name (no path separator) is resolved against `$PATH`
            // at spawn time and can't be checked here; only reject
            // explicit paths that don't exist.
            let looks_like_path = runtime.command.contains('/') || runtime.command.contains(std::path::MAIN_SEPARATOR);
            if looks_like_path && !Path::new(&runtime.command).exists() {
                return Err(ConfigError::MissingExecutable {
                    label: runtime.label.clone(),
                    command: runtime.command.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeTargetConfig {
    pub label: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub timeout_ms: u64,
}

impl From<RuntimeTargetConfig> for RuntimeTarget {
    fn from(c: RuntimeTargetConfig) -> Self {
        Self {
            label: c.label,
            command: c.command,
            args: c.args,
            timeout_ms: c.timeout_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub enum SignificanceLevelConfig {
    #[default]
    SeedEvolution,
    Reporting,
}

impl From<SignificanceLevelConfig> for SignificanceLevel {
    fn from(c: SignificanceLevelConfig) -> Self {
        match c {
            SignificanceLevelConfig::SeedEvolution => Self::SeedEvolution,
            SignificanceLevelConfig::Reporting => Self::Reporting,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolConfigToml {
    pub max_size: usize,
    pub min_energy: u32,
    pub energy_boost: u32,
    pub initial_energy: u32,
}

impl Default for PoolConfigToml {
    fn default() -> Self {
        let d = PoolConfig::default();
        Self {
            max_size: d.max_size,
            min_energy: d.min_energy,
            energy_boost: d.energy_boost,
            initial_energy: d.initial_energy,
        }
    }
}

impl From<PoolConfigToml> for PoolConfig {
    fn from(c: PoolConfigToml) -> Self {
        Self {
            max_size: c.max_size,
            min_energy: c.min_energy,
            energy_boost: c.energy_boost,
            initial_energy: c.initial_energy,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectorConfigToml {
    pub exploration_factor: f64,
    pub forget_frequency: u64,
    pub forget_factor: f64,
}

impl Default for SelectorConfigToml {
    fn default() -> Self {
        let d = SelectorConfig::default();
        Self {
            exploration_factor: d.exploration_factor,
            forget_frequency: d.forget_frequency,
            forget_factor: d.forget_factor,
        }
    }
}

impl From<SelectorConfigToml> for SelectorConfig {
    fn from(c: SelectorConfigToml) -> Self {
        Self {
            exploration_factor: c.exploration_factor,
            forget_frequency: c.forget_frequency,
            forget_factor: c.forget_factor,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VerifierConfigToml {
    pub batch_size: usize,
    pub top_n: usize,
}

impl Default for VerifierConfigToml {
    fn default() -> Self {
        let d = VerifierConfig::default();
        Self {
            batch_size: d.batch_size,
            top_n: d.top_n,
        }
    }
}

impl From<VerifierConfigToml> for VerifierConfig {
    fn from(c: VerifierConfigToml) -> Self {
        Self {
            batch_size: c.batch_size,
            top_n: c.top_n,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalyzerConfigToml {
    pub w_timeout: f64,
    pub w_error: f64,
    pub w_compiler: f64,
    pub compiler_probability_gate: f64,
    /// Overrides the significance-level-derived time-deviation threshold
    /// percentage for both levels, when set.
    #[serde(default)]
    pub time_pct: Option<f64>,
    /// Overrides the significance-level-derived memory-deviation threshold
    /// percentage, when set.
    #[serde(default)]
    pub memory_pct: Option<f64>,
}

impl Default for AnalyzerConfigToml {
    fn default() -> Self {
        let d = AnalyzerConfig::default();
        Self {
            w_timeout: d.w_timeout,
            w_error: d.w_error,
            w_compiler: d.w_compiler,
            compiler_probability_gate: d.compiler_probability_gate,
            time_pct: d.time_pct,
            memory_pct: d.memory_pct,
        }
    }
}

impl From<AnalyzerConfigToml> for AnalyzerConfig {
    fn from(c: AnalyzerConfigToml) -> Self {
        Self {
            w_timeout: c.w_timeout,
            w_error: c.w_error,
            w_compiler: c.w_compiler,
            compiler_probability_gate: c.compiler_probability_gate,
            time_pct: c.time_pct,
            memory_pct: c.memory_pct,
        }
    }
}
