//! # arcade_app: service host
//!
//! Runs the maze and tic-tac-toe services against a NATS broker so the
//! LED-matrix clients can offload their game logic.
//!
//! ## Startup Sequence
//!
//! 1. Connect to NATS (`--nats-url`, else `NATS_URL`, else
//!    `nats://localhost:4222`).
//! 2. Subscribe each enabled service to its query topic.
//! 3. Serve until a subscription ends. A failed response publish is logged
//!    and the service keeps going.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use arcade_net::{NatsConnection, Transport};
use arcade_service::{MazeService, ServiceConfig, ServiceRunner, TicTacToeService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Only {
    Maze,
    Tictactoe,
}

#[derive(Debug, Parser)]
#[command(name = "arcade_app", about = "Maze and tic-tac-toe services over NATS")]
struct Args {
    /// NATS server URL (defaults to the NATS_URL environment variable)
    #[arg(short, long)]
    nats_url: Option<String>,

    /// Run a single service instead of both
    #[arg(long, value_enum)]
    only: Option<Only>,

    /// Probability that a maze wall becomes a hazard
    #[arg(long, default_value_t = arcade_games::maze::DEFAULT_HAZARD_PROBABILITY)]
    hazard_probability: f64,

    /// Largest accepted maze width or height
    #[arg(long, default_value_t = arcade_games::maze::DEFAULT_MAX_DIMENSION)]
    max_dimension: usize,

    /// Seed for reproducible mazes
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::new()
            .with_hazard_probability(self.hazard_probability)
            .with_max_dimension(self.max_dimension);
        if let Some(url) = &self.nats_url {
            config = config.with_nats_url(url);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("arcade_app=info".parse()?))
        .init();

    let args = Args::parse();
    let config = args.service_config();
    info!(
        only = ?args.only,
        hazard_probability = config.maze.hazard_probability,
        max_dimension = config.maze.max_dimension,
        "arcade services starting"
    );

    let conn = match config.nats_url.as_deref() {
        Some(url) => NatsConnection::connect_to(url).await?,
        None => NatsConnection::connect().await?,
    };
    let transport: Arc<dyn Transport> = Arc::new(conn);

    let maze = ServiceRunner::new(MazeService::from_config(&config));
    let tictactoe = ServiceRunner::new(TicTacToeService);

    match args.only {
        Some(Only::Maze) => maze.run(transport).await?,
        Some(Only::Tictactoe) => tictactoe.run(transport).await?,
        None => {
            tokio::try_join!(maze.run(Arc::clone(&transport)), tictactoe.run(transport))?;
        }
    }

    info!("arcade services shut down");
    Ok(())
}
