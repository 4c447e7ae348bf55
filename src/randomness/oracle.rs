//! OracleSource — asynchronous, unpredictable randomness
//!
//! Each request spawns a task on the tokio runtime the source was built in.
//! The task waits out the configured latency, draws 32 bytes from the OS
//! CSPRNG and delivers them. There is no timeout: a request that never
//! completes leaves its token waiting.

use super::{Fulfillment, FulfillmentSink, RandomnessRequest, RandomnessSource};
use crate::error::RevealError;
use crate::seed::{Word, WORD_LEN};
use log::{info, warn};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::time::{self, Duration};

/// Configuration for the oracle source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Delay between request and delivery (milliseconds)
    pub latency_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self { latency_ms: 250 }
    }
}

pub struct OracleSource {
    pub config: OracleConfig,
    handle: Handle,
    in_flight: u64,
}

impl OracleSource {
    /// Must be called from within a tokio runtime
    pub fn new(config: OracleConfig) -> Result<Self, RevealError> {
        let handle = Handle::try_current()
            .map_err(|e| RevealError::SourceUnavailable(format!("no tokio runtime: {}", e)))?;
        Ok(Self {
            config,
            handle,
            in_flight: 0,
        })
    }

    /// Requests handed to the runtime so far
    pub fn requests_sent(&self) -> u64 {
        self.in_flight
    }

    fn draw() -> Word {
        let mut bytes = [0u8; WORD_LEN];
        OsRng.fill_bytes(&mut bytes);
        Word::from_bytes(bytes)
    }
}

impl RandomnessSource for OracleSource {
    fn name(&self) -> &str {
        "oracle"
    }

    fn request(&mut self, request: &RandomnessRequest, sink: &FulfillmentSink) -> Result<(), RevealError> {
        let request = request.clone();
        let sink = sink.clone();
        let latency = Duration::from_millis(self.config.latency_ms);
        self.handle.spawn(async move {
            time::sleep(latency).await;
            let fulfillment = Fulfillment::new(&request, Self::draw());
            match sink.deliver(fulfillment) {
                Ok(()) => info!(
                    "Oracle fulfilled request {} for token {}",
                    &request.request_id[..8],
                    request.token_id
                ),
                Err(e) => warn!("Oracle could not deliver for token {}: {}", request.token_id, e),
            }
        });
        self.in_flight += 1;
        Ok(())
    }
}
