//! Campaign entry point: `harness run|report|replay`.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use perffuzz_contracts::{AnomalyRepository, MutationStrategy, RuntimeExecutor, RuntimeTarget};
use perffuzz_exec::ProcessExecutor;
use perffuzz_harness::strategies;
use perffuzz_harness::structured_log::{LogEmitter, LogEntry, LogLevel};
use perffuzz_loop::{Config, FileRepository, FuzzerLoop};
use perffuzz_metrics::Seed;
use perffuzz_seedpool::SeedPool;
use perffuzz_selector::AdaptiveMutationSelector;
use perffuzz_verifier::Verifier;

#[derive(Parser)]
#[command(name = "harness", about = "Differential performance fuzzer for managed runtimes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a fuzzing campaign to completion (or until the pool is exhausted).
    Run {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        corpus_dir: PathBuf,
        #[arg(long, default_value = "anomalies.jsonl")]
        out: PathBuf,
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Summarize confirmed anomalies previously written by `run`.
    Report {
        #[arg(long, default_value = "anomalies.jsonl")]
        out: PathBuf,
    },
    /// Execute one program unit across every runtime target in a config and print the raw metrics.
    Replay {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        program: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            config,
            corpus_dir,
            out,
            log,
        } => run(&config, &corpus_dir, &out, log.as_deref()),
        Command::Report { out } => report(&out),
        Command::Replay { config, program } => replay(&config, &program),
    }
}

fn run(config_path: &PathBuf, corpus_dir: &PathBuf, out: &PathBuf, log_path: Option<&std::path::Path>) -> Result<(), Box<dyn Error>> {
    let raw = fs::read_to_string(config_path)?;
    let config = Config::from_toml(&raw)?;

    let mut initial_seeds = Vec::new();
    for entry in fs::read_dir(corpus_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            let bytes = fs::read(entry.path())?;
            let name = entry.file_name().to_string_lossy().into_owned();
            initial_seeds.push(Seed::initial(bytes, name, "corpus", config.pool.initial_energy));
        }
    }
    if initial_seeds.is_empty() {
        return Err("corpus directory contained no files".into());
    }

    let pool = SeedPool::new(initial_seeds, config.pool.into(), config.rng_seed);

    let mut strategy_impls: Vec<Box<dyn MutationStrategy>> = Vec::new();
    for name in &config.strategies {
        match strategies::resolve(name) {
            Some(s) => strategy_impls.push(s),
            None => return Err(format!("unknown mutation strategy: {name}").into()),
        }
    }
    let strategy_names: Vec<String> = strategy_impls.iter().map(|s| s.name().to_string()).collect();
    let selector = AdaptiveMutationSelector::new(strategy_names, config.selector.into(), config.rng_seed ^ 0xFEED);

    let work_dir = std::env::temp_dir().join(format!("perffuzz-{}", std::process::id()));
    fs::create_dir_all(&work_dir)?;
    let mut executors: Vec<(RuntimeTarget, Arc<dyn RuntimeExecutor>)> = Vec::new();
    for target in config.runtimes {
        let target: RuntimeTarget = target.into();
        executors.push((target, Arc::new(ProcessExecutor::new(work_dir.clone()))));
    }

    let verifier = Verifier::new(config.verifier.into());
    let repository: Box<dyn AnomalyRepository> = Box::new(FileRepository::new(out.clone()));

    let mut loop_runner = FuzzerLoop::new(
        pool,
        selector,
        strategy_impls,
        executors,
        config.analyzer.into(),
        verifier,
        repository,
        config.stagnation_threshold,
    );

    let mut emitter = match log_path {
        Some(p) => Some(LogEmitter::to_file(p, "campaign")?),
        None => None,
    };

    for _ in 0..config.max_iterations {
        if loop_runner.is_stagnated() {
            break;
        }
        let Some(outcome) = loop_runner.step()? else {
            break;
        };
        if let Some(emitter) = emitter.as_mut() {
            let entry = LogEntry::new("", LogLevel::Info, "iteration")
                .with_iteration(outcome.iteration)
                .with_strategy(outcome.strategy)
                .with_interestingness(outcome.child_interestingness)
                .with_confirmed(outcome.confirmed_this_batch);
            emitter.emit(entry)?;
        }
    }
    if let Some(emitter) = emitter.as_mut() {
        emitter.flush()?;
    }

    println!("completed {} iterations", loop_runner.iteration());
    Ok(())
}

fn report(out: &PathBuf) -> Result<(), Box<dyn Error>> {
    let repo = FileRepository::new(out.clone());
    let records = repo.load_all()?;
    let total: usize = records.iter().map(|r| r.groups.len()).sum();
    println!("{} confirmed anomaly record(s), {} group(s) total", records.len(), total);
    for record in &records {
        for group in &record.groups {
            println!(
                "  seed={} kind={:?} interestingness={:.2} description={}",
                record.seed_id, group.kind, group.interestingness, group.description
            );
        }
    }
    Ok(())
}

fn replay(config_path: &PathBuf, program: &PathBuf) -> Result<(), Box<dyn Error>> {
    let raw = fs::read_to_string(config_path)?;
    let config = Config::from_toml(&raw)?;
    let bytes = fs::read(program)?;
    let work_dir = std::env::temp_dir().join(format!("perffuzz-replay-{}", std::process::id()));
    fs::create_dir_all(&work_dir)?;

    for target in config.runtimes {
        let target: RuntimeTarget = target.into();
        let executor = ProcessExecutor::new(work_dir.clone());
        let metrics = executor.execute(&target, &bytes)?;
        println!("{}: {metrics:?}", target.label);
    }
    Ok(())
}
