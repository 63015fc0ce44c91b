//! The signal chain seam.
//!
//! A [`SignalChain`] is one direction of the software-defined radio: the
//! transmit pipeline (audio in, RF out) or the receive pipeline (RF in,
//! audio out). Filter design, resampling, and device I/O all live behind
//! this trait; the rig-control server only starts, stops, and tunes chains.
//!
//! Two chains share one physical device context, so callers must fully
//! stop one ([`stop`](SignalChain::stop) followed by
//! [`wait`](SignalChain::wait)) before starting the other.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ChannelId;

/// Asynchronous control surface of one signal-processing pipeline.
///
/// Implementations may block for a noticeable time inside `start()` and
/// `wait()` while the device opens or drains. Callers that need a bound
/// should wrap these calls in a timeout.
#[async_trait]
pub trait SignalChain: Send + Sync {
    /// Short label used in logs (e.g. `"tx"` or `"rx"`).
    fn label(&self) -> &str;

    /// Begin active operation. Fails if the device cannot be opened.
    async fn start(&mut self) -> Result<()>;

    /// Request a graceful stop. Returns once the request is accepted; use
    /// [`wait`](SignalChain::wait) to block until the chain is idle.
    async fn stop(&mut self) -> Result<()>;

    /// Block until the chain has fully stopped and released the device.
    async fn wait(&mut self) -> Result<()>;

    /// Read the tuned center frequency of a channel in hertz.
    async fn get_frequency(&self, channel: ChannelId) -> Result<f64>;

    /// Retune a channel. Chains reject values outside their tunable range.
    async fn set_frequency(&mut self, channel: ChannelId, hz: f64) -> Result<()>;
}
