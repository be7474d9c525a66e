//! Envelope types exchanged over the broker.
//!
//! The game payloads from [`arcade_games`] travel as flat JSON documents. An
//! optional `request_id` sits next to the payload fields so responses can be
//! matched to the request that caused them; older clients that omit it are
//! still served, they just cannot tell concurrent responses apart.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::NetError;

/// An outgoing envelope: the body's fields flattened beside the request id.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<'a, T> {
    /// Correlates a response with its request. Echoed verbatim by services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    /// The payload.
    #[serde(flatten)]
    pub body: &'a T,
}

/// The routing fields of any incoming envelope. Payload fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvelopeHeader {
    /// The request id, if the sender attached one.
    #[serde(default)]
    pub request_id: Option<Uuid>,
    /// Set when the envelope is a [`Fault`].
    #[serde(default)]
    pub error: Option<String>,
}

impl EnvelopeHeader {
    /// Read the routing fields from a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Decode`] if the payload is not a JSON object or
    /// carries a malformed request id.
    pub fn read(payload: &[u8]) -> Result<Self, NetError> {
        crate::codec::decode(payload)
    }
}

/// Published on a response topic in place of a response when the service
/// rejects a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    /// Human-readable reason.
    pub error: String,
}
