//! Request/response over a pair of broker topics.
//!
//! The broker only offers fire-and-forget publishing and asynchronous
//! delivery. [`RequestBridge`] turns that into a call:
//!
//! 1. [`RequestBridge::connect`] subscribes to the response topic and spawns
//!    a listener task before anything is published.
//! 2. [`RequestBridge::publish`] stamps a fresh request id on the envelope,
//!    parks a one-shot slot for it and publishes on the query topic.
//! 3. The listener reads the `request_id` of each response and completes the
//!    matching slot. Unknown, missing or malformed ids are logged and dropped.
//! 4. [`PendingCall::await_response`] waits on its own slot, bounded by
//!    [`BridgeConfig::response_timeout`].
//!
//! Any number of calls may be outstanding on one bridge, and any number of
//! bridges may share a topic pair.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::StreamExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::codec;
use crate::error::NetError;
use crate::messages::{Envelope, EnvelopeHeader};
use crate::topics::TopicPair;
use crate::transport::{DeliveryStream, Transport};

/// How long a call waits for its response unless configured otherwise.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a [`RequestBridge`].
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Upper bound on the wait for each response.
    pub response_timeout: Duration,
}

impl BridgeConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the response timeout.
    #[must_use]
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

/// Outstanding calls keyed by request id.
#[derive(Debug, Default)]
struct PendingCalls {
    slots: DashMap<Uuid, oneshot::Sender<Vec<u8>>>,
}

impl PendingCalls {
    fn register(&self) -> (Uuid, oneshot::Receiver<Vec<u8>>) {
        let request_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.slots.insert(request_id, tx);
        (request_id, rx)
    }

    /// Hand `payload` to the caller waiting on `request_id`.
    ///
    /// Returns `false` if nobody is waiting for that id any more.
    fn complete(&self, request_id: Uuid, payload: Vec<u8>) -> bool {
        match self.slots.remove(&request_id) {
            Some((_, sender)) => sender.send(payload).is_ok(),
            None => false,
        }
    }

    fn cancel(&self, request_id: &Uuid) -> bool {
        self.slots.remove(request_id).is_some()
    }

    /// Drop every slot so all waiters observe [`NetError::Closed`].
    fn close_all(&self) {
        self.slots.clear();
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

/// A client-side endpoint for one query/response topic pair.
#[derive(Debug)]
pub struct RequestBridge {
    transport: Arc<dyn Transport>,
    topics: TopicPair,
    config: BridgeConfig,
    pending: Arc<PendingCalls>,
    listener: JoinHandle<()>,
}

impl RequestBridge {
    /// Subscribe to the response topic and start routing responses.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the subscription fails.
    pub async fn connect(
        transport: Arc<dyn Transport>,
        topics: TopicPair,
        config: BridgeConfig,
    ) -> Result<Self, NetError> {
        let deliveries = transport.subscribe(&topics.response).await?;
        let pending = Arc::new(PendingCalls::default());
        let listener = tokio::spawn(route_responses(deliveries, Arc::clone(&pending)));

        info!(
            query = topics.query,
            response = topics.response,
            timeout_ms = config.response_timeout.as_millis() as u64,
            "request bridge ready"
        );

        Ok(Self {
            transport,
            topics,
            config,
            pending,
            listener,
        })
    }

    /// The topic pair this bridge serves.
    #[must_use]
    pub fn topics(&self) -> &TopicPair {
        &self.topics
    }

    /// Number of calls still waiting for a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Publish `request` under a fresh request id.
    ///
    /// The returned handle is the only way to observe the response; dropping
    /// it abandons the call.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if encoding or publishing fails.
    pub async fn publish<Req>(&self, request: &Req) -> Result<PendingCall, NetError>
    where
        Req: Serialize + Sync,
    {
        let (request_id, receiver) = self.pending.register();
        let call = PendingCall {
            request_id,
            receiver,
            pending: Arc::clone(&self.pending),
            topic: self.topics.response.clone(),
            timeout: self.config.response_timeout,
        };

        let payload = codec::encode(&Envelope {
            request_id: Some(request_id),
            body: request,
        })?;
        self.transport.publish(&self.topics.query, payload).await?;
        debug!(%request_id, topic = self.topics.query, "request published");

        Ok(call)
    }

    /// Publish `request` and wait for its response.
    ///
    /// # Errors
    ///
    /// See [`RequestBridge::publish`] and [`PendingCall::await_response`].
    pub async fn call<Req, Resp>(&self, request: &Req) -> Result<Resp, NetError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        self.publish(request).await?.await_response().await
    }
}

impl Drop for RequestBridge {
    fn drop(&mut self) {
        self.listener.abort();
        self.pending.close_all();
    }
}

/// A published request whose response has not been consumed yet.
#[derive(Debug)]
pub struct PendingCall {
    request_id: Uuid,
    receiver: oneshot::Receiver<Vec<u8>>,
    pending: Arc<PendingCalls>,
    topic: String,
    timeout: Duration,
}

impl PendingCall {
    /// The id stamped on the published envelope.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Wait for the response to this call.
    ///
    /// # Errors
    ///
    /// - [`NetError::Timeout`] if nothing arrives within the configured bound.
    /// - [`NetError::Remote`] if the service answered with a fault.
    /// - [`NetError::Decode`] if the response does not match `Resp`.
    /// - [`NetError::Closed`] if the bridge was dropped or its subscription
    ///   ended.
    pub async fn await_response<Resp: DeserializeOwned>(mut self) -> Result<Resp, NetError> {
        let payload = match tokio::time::timeout(self.timeout, &mut self.receiver).await {
            Ok(Ok(payload)) => payload,
            Ok(Err(_)) => return Err(NetError::Closed),
            Err(_) => {
                warn!(
                    request_id = %self.request_id,
                    topic = self.topic,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "timed out waiting for response"
                );
                return Err(NetError::Timeout {
                    topic: self.topic.clone(),
                    after: self.timeout,
                });
            }
        };

        let header = EnvelopeHeader::read(&payload)?;
        if let Some(error) = header.error {
            return Err(NetError::Remote(error));
        }
        codec::decode(&payload)
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        self.pending.cancel(&self.request_id);
    }
}

async fn route_responses(mut deliveries: DeliveryStream, pending: Arc<PendingCalls>) {
    while let Some(delivery) = deliveries.next().await {
        let header = match EnvelopeHeader::read(&delivery.payload) {
            Ok(header) => header,
            Err(e) => {
                warn!(topic = delivery.topic, error = %e, "dropping malformed response");
                continue;
            }
        };
        let Some(request_id) = header.request_id else {
            debug!(topic = delivery.topic, "ignoring response without request id");
            continue;
        };
        if !pending.complete(request_id, delivery.payload) {
            debug!(%request_id, topic = delivery.topic, "no caller waiting for response");
        }
    }
    debug!("response subscription ended");
    pending.close_all();
}
