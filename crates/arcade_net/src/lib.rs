//! # arcade_net
//!
//! Broker transport layer for the arcade offload services.
//!
//! This crate provides:
//!
//! - [`topics`]: the fixed query/response topic names.
//! - [`messages`]: envelopes carrying request ids and faults.
//! - [`codec`]: JSON serialisation/deserialisation helpers.
//! - [`transport`]: the [`Transport`] seam and the in-process [`LocalBroker`].
//! - [`connection`]: NATS connection management.
//! - [`bridge`]: request/response calls over a topic pair.
//! - [`client`]: typed maze and tic-tac-toe clients.
//! - [`error`]: network-layer error types.

pub mod bridge;
pub mod client;
pub mod codec;
pub mod connection;
pub mod error;
pub mod messages;
pub mod topics;
pub mod transport;

pub use bridge::{BridgeConfig, PendingCall, RequestBridge};
pub use client::{MazeClient, TicTacToeClient};
pub use codec::{decode, encode};
pub use connection::NatsConnection;
pub use error::NetError;
pub use messages::{Envelope, EnvelopeHeader, Fault};
pub use topics::TopicPair;
pub use transport::{Delivery, DeliveryStream, LocalBroker, Transport};
