//! Deffuant CLI - run a bounded-confidence opinion simulation from a TOML file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use deffuant_core_rs::orchestrator::ConvergenceMonitor;
use deffuant_core_rs::{DeffuantModel, SimulationOptions, StateSnapshot};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deffuant")]
#[command(author, version, about = "Deffuant bounded-confidence opinion dynamics", long_about = None)]
struct Cli {
    /// Simulation config (TOML)
    config: PathBuf,

    /// Agent file (`idx, opinion[, activity]` per line)
    #[arg(short, long)]
    agents: Option<PathBuf>,

    /// Network file (`idx, n, neighbours..[, weights..]` per line)
    #[arg(short, long)]
    network: Option<PathBuf>,

    /// Output directory (must not contain earlier results)
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Override `rng_seed` from the config
    #[arg(long)]
    seed: Option<u64>,

    /// Override `model.max_iterations` from the config
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Also stop once the opinion spread falls below this value
    #[arg(long)]
    converge: Option<f64>,

    /// Write a resumable checkpoint (JSON) after the run
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Continue from a checkpoint written with `--checkpoint`
    ///
    /// Use the same config and network file as the checkpointed run.
    #[arg(long, conflicts_with = "agents")]
    resume: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut options = SimulationOptions::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    if cli.seed.is_some() {
        options.rng_seed = cli.seed;
    }
    if cli.max_iterations.is_some() {
        options.model.max_iterations = cli.max_iterations;
    }

    let mut model = match &cli.resume {
        Some(path) => {
            let snapshot = StateSnapshot::load(path)
                .with_context(|| format!("failed to read checkpoint {}", path.display()))?;
            info!(path = %path.display(), iteration = snapshot.iteration, "resuming");
            DeffuantModel::from_checkpoint(options, cli.network.as_deref(), snapshot)
                .context("checkpoint does not match the config")?
        }
        None => DeffuantModel::new(options, cli.agents.as_deref(), cli.network.as_deref())
            .context("failed to set up simulation")?,
    };
    info!(seed = model.engine().rng_seed(), "seed");

    let summary = match cli.converge {
        Some(epsilon) => {
            let monitor = ConvergenceMonitor::new(epsilon, model.n_agents());
            model.run_until(&cli.output, monitor)
        }
        None => model.run(&cli.output),
    }
    .with_context(|| format!("simulation failed (output: {})", cli.output.display()))?;

    println!(
        "{:?} after {} iterations ({} updates), opinion spread {:.6}",
        summary.reason, summary.final_iteration, summary.updates, summary.opinion_spread
    );

    if let Some(path) = &cli.checkpoint {
        model
            .engine()
            .checkpoint()
            .and_then(|snapshot| snapshot.save(path))
            .with_context(|| format!("failed to write checkpoint {}", path.display()))?;
        info!(path = %path.display(), "checkpoint written");
    }

    Ok(())
}
