//! Service configuration.

use arcade_games::MazeConfig;

/// Configuration for a service process.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Optional NATS URL override (defaults to `NATS_URL` env or localhost).
    pub nats_url: Option<String>,
    /// Maze generation tunables.
    pub maze: MazeConfig,
    /// Seed for reproducible mazes. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl ServiceConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the NATS URL.
    #[must_use]
    pub fn with_nats_url(mut self, url: impl Into<String>) -> Self {
        self.nats_url = Some(url.into());
        self
    }

    /// Override the hazard probability for generated mazes.
    #[must_use]
    pub fn with_hazard_probability(mut self, probability: f64) -> Self {
        self.maze = self.maze.with_hazard_probability(probability);
        self
    }

    /// Override the largest accepted maze width or height.
    #[must_use]
    pub fn with_max_dimension(mut self, max_dimension: usize) -> Self {
        self.maze = self.maze.with_max_dimension(max_dimension);
        self
    }

    /// Make maze generation reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
