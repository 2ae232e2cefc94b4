use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pong_ddqn::config::{RunConfig, SessionMode};
use pong_ddqn::protocol::GameVariant;
use pong_ddqn::server::Server;
use tracing::{info, Level};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "pong-ddqn", about = "Double-DQN Pong agents served over TCP")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train fresh (or preloaded) agents against one game connection
    Train(RunArgs),
    /// Play with fixed exploration, serving games until interrupted
    Eval(EvalArgs),
}

#[derive(Args)]
struct RunArgs {
    /// JSON config file; missing keys fall back to defaults
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    variant: Option<GameVariant>,
    #[arg(long)]
    episodes: Option<usize>,
    /// Listen address, e.g. 127.0.0.1:10000
    #[arg(long)]
    addr: Option<String>,
    /// Weight file per agent, in agent order
    #[arg(long = "load")]
    load: Vec<PathBuf>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    #[arg(long)]
    read_timeout_ms: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct EvalArgs {
    #[command(flatten)]
    run: RunArgs,
    /// Exploration rate; defaults to the variant's evaluation rate
    #[arg(long)]
    epsilon: Option<f32>,
}

impl RunArgs {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(variant) = self.variant {
            config.session.variant = variant;
        }
        if let Some(episodes) = self.episodes {
            config.session.num_episodes = episodes;
        }
        if let Some(addr) = &self.addr {
            config.server.address = addr.clone();
        }
        if !self.load.is_empty() {
            config.artifacts.load_weights = self.load.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.artifacts.output_dir = dir.clone();
        }
        if self.read_timeout_ms.is_some() {
            config.server.read_timeout_ms = self.read_timeout_ms;
        }
        if self.seed.is_some() {
            config.agent.seed = self.seed;
        }
    }

    fn load_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => RunConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn serve(config: RunConfig) -> Result<()> {
    let config = config.finalize().context("invalid configuration")?;
    info!(
        variant = ?config.session.variant,
        mode = ?config.session.mode,
        episodes = config.session.num_episodes,
        "configuration loaded"
    );
    let mut server = Server::from_config(config).context("building agents")?;
    server.run().context("server stopped")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Train(args) => {
            let mut config = args.load_config()?;
            config.session.mode = SessionMode::Training;
            serve(config)
        }
        Commands::Eval(args) => {
            let mut config = args.run.load_config()?;
            let epsilon = match (args.epsilon, config.session.mode) {
                (Some(epsilon), _) => epsilon,
                (None, SessionMode::Evaluation { epsilon }) => epsilon,
                (None, SessionMode::Training) => config.session.variant.default_eval_epsilon(),
            };
            config.session.mode = SessionMode::Evaluation { epsilon };
            serve(config)
        }
    }
}
