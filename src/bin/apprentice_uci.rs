//! apprentice-uci - line-protocol engine for the 3x3 game
//!
//! Reads commands on stdin and answers on stdout. Logs go to stderr.
//!
//! Exits nonzero if the apprentice model cannot be loaded; pass `--fresh`
//! to start from an empty model instead.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use apprentice_mcts::games::TicTacToe;
use apprentice_mcts::{EngineConfig, TabularApprentice, UciSession};

#[derive(Debug, Parser)]
#[command(name = "apprentice-uci", version, about = "MCTS engine guided by a learned apprentice")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Apprentice model file (overrides the config)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Start with an empty model instead of loading one
    #[arg(long)]
    fresh: bool,

    /// Search seed (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Root-parallel workers, 0 for all cores (overrides the config)
    #[arg(long)]
    workers: Option<usize>,

    /// Log filter when RUST_LOG is unset (overrides the config)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut EngineConfig) {
        if let Some(model) = &self.model {
            config.protocol.model_path = model.clone();
        }
        if let Some(seed) = self.seed {
            config.search.seed = seed;
        }
        if let Some(workers) = self.workers {
            config.search.workers = workers;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = EngineConfig::load_or_default(args.config.as_deref())?;
    args.apply(&mut config);
    init_tracing(&config.log_level);

    let env = TicTacToe::new();
    let model_path = config.protocol.model_path.clone();
    let apprentice = if args.fresh {
        info!("starting with an empty apprentice");
        TabularApprentice::new(env)
    } else {
        TabularApprentice::load(env, &model_path)
            .with_context(|| format!("failed to load apprentice from {}", model_path.display()))?
    };
    info!(
        model = %model_path.display(),
        states = apprentice.len(),
        workers = config.search.resolved_workers(),
        "engine ready"
    );

    let mut session = UciSession::new(&env, apprentice, env.initial_state(), config);
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    session.run(stdin.lock(), &mut stdout)?;
    Ok(())
}
