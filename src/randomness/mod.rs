//! Randomness sources — the external entropy half of commit-reveal
//!
//! A source receives one [`RandomnessRequest`] per token and later delivers
//! exactly one [`Fulfillment`] through the provider's [`FulfillmentSink`].
//! Fulfillments can only be minted by the sources in this module, so the
//! provider's randomness callback cannot be driven with arbitrary values.
//!
//! Two sources are provided:
//! - DeterministicSource: counter-derived values, delivered immediately (testing only)
//! - OracleSource: OS entropy delivered asynchronously after a latency

mod stub;
mod oracle;

pub use oracle::{OracleConfig, OracleSource};
pub use stub::DeterministicSource;

use crate::error::RevealError;
use crate::seed::{TokenId, Word};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Capability to supply one unpredictable value per request
pub trait RandomnessSource {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Accept `request`; the value must be delivered through `sink` exactly once
    fn request(&mut self, request: &RandomnessRequest, sink: &FulfillmentSink) -> Result<(), RevealError>;
}

/// An outstanding request for entropy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessRequest {
    pub request_id: String,
    pub token_id: TokenId,
}

impl RandomnessRequest {
    pub fn new(token_id: TokenId) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            token_id,
        }
    }
}

/// A delivered random value, bound to the request that asked for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulfillment {
    request_id: String,
    token_id: TokenId,
    value: Word,
}

impl Fulfillment {
    pub(crate) fn new(request: &RandomnessRequest, value: Word) -> Self {
        Self {
            request_id: request.request_id.clone(),
            token_id: request.token_id,
            value,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    pub fn value(&self) -> &Word {
        &self.value
    }
}

/// Delivery channel from sources back to the provider
#[derive(Debug, Clone)]
pub struct FulfillmentSink(mpsc::UnboundedSender<Fulfillment>);

impl FulfillmentSink {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Fulfillment>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    pub(crate) fn deliver(&self, fulfillment: Fulfillment) -> Result<(), RevealError> {
        self.0
            .send(fulfillment)
            .map_err(|_| RevealError::SourceUnavailable("fulfillment channel closed".to_string()))
    }
}
