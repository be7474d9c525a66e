//! NATS connection management.
//!
//! Provides a thin wrapper around `async-nats` implementing [`Transport`].

use async_trait::async_trait;
use futures::StreamExt;
use tracing::info;

use crate::error::NetError;
use crate::transport::{Delivery, DeliveryStream, Transport};

/// Default NATS server URL.
pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// The environment variable used to override the NATS URL.
pub const NATS_URL_ENV: &str = "NATS_URL";

/// A wrapper around an `async-nats` client.
#[derive(Debug, Clone)]
pub struct NatsConnection {
    /// The underlying NATS client.
    client: async_nats::Client,
}

impl NatsConnection {
    /// Connect to NATS using the URL from the `NATS_URL` environment variable,
    /// falling back to [`DEFAULT_NATS_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect() -> Result<Self, NetError> {
        let url = std::env::var(NATS_URL_ENV).unwrap_or_else(|_| DEFAULT_NATS_URL.to_string());
        Self::connect_to(&url).await
    }

    /// Connect to NATS at the specified URL.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect_to(url: &str) -> Result<Self, NetError> {
        info!(url, "connecting to NATS");
        let client = async_nats::connect(url).await?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Returns a reference to the underlying `async-nats` client.
    #[must_use]
    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for NatsConnection {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), NetError> {
        self.client
            .publish(topic.to_string(), payload.into())
            .await?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<DeliveryStream, NetError> {
        let subscriber = self.client.subscribe(topic.to_string()).await?;
        Ok(subscriber
            .map(|message| Delivery {
                topic: message.subject.to_string(),
                payload: message.payload.to_vec(),
            })
            .boxed())
    }
}
