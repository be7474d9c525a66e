//! The compute services answering broker requests.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use serde::de::DeserializeOwned;

use arcade_games::{
    GameError, MazeConfig, MazeRequest, MazeResponse, TicTacToeRequest, TicTacToeResponse, maze,
    tictactoe,
};
use arcade_net::TopicPair;

use crate::config::ServiceConfig;

/// A stateless request handler bound to a topic pair.
pub trait Service: Send + Sync + 'static {
    /// Decoded from each delivery on the query topic.
    type Request: DeserializeOwned + Send;
    /// Published on the response topic.
    type Response: Serialize + Send + Sync;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Where requests arrive and responses go.
    fn topics(&self) -> TopicPair;

    /// Compute the response to one request.
    ///
    /// # Errors
    ///
    /// Returns a [`GameError`] if the request violates a precondition.
    fn handle(&self, request: Self::Request) -> Result<Self::Response, GameError>;
}

/// Generates mazes on `labyrinth/query`.
///
/// Each request gets its own RNG, so the service needs no lock. When seeded,
/// the n-th request is generated from `seed + n`.
#[derive(Debug, Default)]
pub struct MazeService {
    config: MazeConfig,
    seed: Option<u64>,
    served: AtomicU64,
}

impl MazeService {
    /// Create a maze service with the given tunables.
    #[must_use]
    pub fn new(config: MazeConfig) -> Self {
        Self {
            config,
            seed: None,
            served: AtomicU64::new(0),
        }
    }

    /// Create a maze service from a [`ServiceConfig`].
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        let service = Self::new(config.maze);
        match config.seed {
            Some(seed) => service.with_seed(seed),
            None => service,
        }
    }

    /// Make generation reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn next_rng(&self) -> StdRng {
        let n = self.served.fetch_add(1, Ordering::Relaxed);
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_entropy(),
        }
    }
}

impl Service for MazeService {
    type Request = MazeRequest;
    type Response = MazeResponse;

    fn name(&self) -> &'static str {
        "maze"
    }

    fn topics(&self) -> TopicPair {
        TopicPair::labyrinth()
    }

    fn handle(&self, request: MazeRequest) -> Result<MazeResponse, GameError> {
        let mut rng = self.next_rng();
        maze::generate(&request, &self.config, &mut rng)
    }
}

/// Arbitrates tic-tac-toe moves on `tictactoe/input`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TicTacToeService;

impl Service for TicTacToeService {
    type Request = TicTacToeRequest;
    type Response = TicTacToeResponse;

    fn name(&self) -> &'static str {
        "tictactoe"
    }

    fn topics(&self) -> TopicPair {
        TopicPair::tictactoe()
    }

    fn handle(&self, request: TicTacToeRequest) -> Result<TicTacToeResponse, GameError> {
        tictactoe::play(&request)
    }
}
