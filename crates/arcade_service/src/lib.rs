//! # arcade_service
//!
//! Service runtime for the arcade offload backend.
//!
//! This crate provides the harness that turns a game handler into a
//! broker-connected service. Each service:
//!
//! 1. Subscribes to its query topic.
//! 2. Decodes each request, skipping malformed payloads.
//! 3. Computes the response, or a fault for a rejected request.
//! 4. Publishes it on the response topic with the request id echoed.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use arcade_net::NatsConnection;
//! use arcade_service::{MazeService, ServiceRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let conn = NatsConnection::connect().await?;
//!     ServiceRunner::new(MazeService::default())
//!         .run(Arc::new(conn))
//!         .await
//! }
//! ```

pub mod config;
pub mod runner;
pub mod service;

pub use config::ServiceConfig;
pub use runner::ServiceRunner;
pub use service::{MazeService, Service, TicTacToeService};
