//! Network-layer error types.

use std::time::Duration;

/// Errors that can occur during network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Failed to encode a message to JSON.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// Failed to decode a message from JSON.
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    /// NATS subscription error.
    #[error("NATS subscribe error: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),

    /// NATS publish error.
    #[error("NATS publish error: {0}")]
    Publish(#[from] async_nats::PublishError),

    /// NATS connection error.
    #[error("NATS connection error: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// No response arrived on the response topic within the bound.
    #[error("no response on {topic} after {after:?}")]
    Timeout {
        /// The response topic that stayed silent.
        topic: String,
        /// How long the caller waited.
        after: Duration,
    },

    /// The service rejected the request.
    #[error("service rejected request: {0}")]
    Remote(String),

    /// The response listener stopped before the call completed.
    #[error("response listener closed")]
    Closed,
}
