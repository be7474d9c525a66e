//! The broker capability consumed by the bridge and the services.
//!
//! [`Transport`] is the seam between the request/response logic and a
//! concrete broker. [`NatsConnection`](crate::NatsConnection) implements it
//! over NATS; [`LocalBroker`] implements it in-process for tests and for
//! hosting clients and services in one binary.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use futures::channel::mpsc;
use futures::stream::BoxStream;
use tracing::trace;

use crate::error::NetError;

/// A message delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// The topic the message was published on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// The stream of deliveries for one subscription.
pub type DeliveryStream = BoxStream<'static, Delivery>;

/// Publish/subscribe access to a message broker.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Publish a payload on a topic.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), NetError>;

    /// Subscribe to a topic. Messages published after this returns are
    /// delivered on the stream.
    async fn subscribe(&self, topic: &str) -> Result<DeliveryStream, NetError>;
}

/// An in-process broker with fan-out delivery to every subscriber of a topic.
///
/// Clones share the same topic table.
#[derive(Debug, Clone, Default)]
pub struct LocalBroker {
    subscribers: Arc<DashMap<String, Vec<mpsc::UnboundedSender<Delivery>>>>,
}

impl LocalBroker {
    /// Create an empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers
            .get(topic)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }
}

#[async_trait]
impl Transport for LocalBroker {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), NetError> {
        if let Some(mut senders) = self.subscribers.get_mut(topic) {
            senders.retain(|tx| {
                tx.unbounded_send(Delivery {
                    topic: topic.to_string(),
                    payload: payload.clone(),
                })
                .is_ok()
            });
            trace!(topic, subscribers = senders.len(), "local publish");
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<DeliveryStream, NetError> {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        Ok(rx.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fan_out_to_all_subscribers() {
        let broker = LocalBroker::new();
        let mut first = broker.subscribe("labyrinth/query").await.unwrap();
        let mut second = broker.subscribe("labyrinth/query").await.unwrap();

        broker
            .publish("labyrinth/query", b"{}".to_vec())
            .await
            .unwrap();

        for stream in [&mut first, &mut second] {
            let delivery = stream.next().await.unwrap();
            assert_eq!(delivery.topic, "labyrinth/query");
            assert_eq!(delivery.payload, b"{}");
        }
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let broker = LocalBroker::new();
        let mut maze = broker.subscribe("labyrinth/response").await.unwrap();
        broker
            .publish("tictactoe/output", b"{}".to_vec())
            .await
            .unwrap();
        broker
            .publish("labyrinth/response", b"[]".to_vec())
            .await
            .unwrap();
        assert_eq!(maze.next().await.unwrap().payload, b"[]");
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let broker = LocalBroker::new();
        let stream = broker.subscribe("tictactoe/input").await.unwrap();
        assert_eq!(broker.subscriber_count("tictactoe/input"), 1);
        drop(stream);
        broker
            .publish("tictactoe/input", b"{}".to_vec())
            .await
            .unwrap();
        assert_eq!(broker.subscriber_count("tictactoe/input"), 0);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let broker = LocalBroker::new();
        assert!(broker.publish("nobody/listens", Vec::new()).await.is_ok());
    }
}
