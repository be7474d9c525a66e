//! Typed clients for the two offloaded games.
//!
//! Each client binds a [`RequestBridge`] to its fixed topic pair and to the
//! request/response types from [`arcade_games`].

use std::sync::Arc;

use arcade_games::{MazeRequest, MazeResponse, TicTacToeRequest, TicTacToeResponse};

use crate::bridge::{BridgeConfig, RequestBridge};
use crate::error::NetError;
use crate::topics::TopicPair;
use crate::transport::Transport;

/// Requests mazes on `labyrinth/query`.
#[derive(Debug)]
pub struct MazeClient {
    bridge: RequestBridge,
}

impl MazeClient {
    /// Subscribe to `labyrinth/response` and get ready to request mazes.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the subscription fails.
    pub async fn connect(
        transport: Arc<dyn Transport>,
        config: BridgeConfig,
    ) -> Result<Self, NetError> {
        let bridge = RequestBridge::connect(transport, TopicPair::labyrinth(), config).await?;
        Ok(Self { bridge })
    }

    /// Ask the maze service for a maze.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Remote`] if the service rejects the request, or
    /// any transport, decode or timeout error from the bridge.
    pub async fn generate(&self, request: &MazeRequest) -> Result<MazeResponse, NetError> {
        self.bridge.call(request).await
    }

    /// The underlying bridge.
    #[must_use]
    pub fn bridge(&self) -> &RequestBridge {
        &self.bridge
    }
}

/// Submits tic-tac-toe moves on `tictactoe/input`.
#[derive(Debug)]
pub struct TicTacToeClient {
    bridge: RequestBridge,
}

impl TicTacToeClient {
    /// Subscribe to `tictactoe/output` and get ready to submit moves.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the subscription fails.
    pub async fn connect(
        transport: Arc<dyn Transport>,
        config: BridgeConfig,
    ) -> Result<Self, NetError> {
        let bridge = RequestBridge::connect(transport, TopicPair::tictactoe(), config).await?;
        Ok(Self { bridge })
    }

    /// Submit a move and receive the outcome of the turn.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Remote`] if the move is rejected, or any
    /// transport, decode or timeout error from the bridge.
    pub async fn play(&self, request: &TicTacToeRequest) -> Result<TicTacToeResponse, NetError> {
        self.bridge.call(request).await
    }

    /// The underlying bridge.
    #[must_use]
    pub fn bridge(&self) -> &RequestBridge {
        &self.bridge
    }
}
