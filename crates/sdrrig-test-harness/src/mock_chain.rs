//! Mock signal chain for deterministic testing of the mode controller.
//!
//! [`MockSignalChain`] implements [`SignalChain`] over shared state that a
//! test keeps a [`MockChainHandle`] to. Every call is recorded, and each
//! operation can be made to fail, or in the case of `wait()`, to hang, so
//! transition error paths and timeouts can be exercised.
//!
//! # Example
//!
//! ```
//! use sdrrig_test_harness::{MockSignalChain, RunningProbe};
//!
//! let probe = RunningProbe::new();
//! let tx = MockSignalChain::new("tx", 14_074_000.0).with_probe(probe.clone());
//! let tx_handle = tx.handle();
//!
//! tx_handle.fail_start(true);
//! assert_eq!(tx_handle.starts(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use sdrrig_core::error::{Error, Result};
use sdrrig_core::{ChannelId, SignalChain};

/// One recorded call into a [`MockSignalChain`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChainCall {
    Start,
    Stop,
    Wait,
    GetFrequency(usize),
    SetFrequency(usize, f64),
}

#[derive(Debug, Default)]
struct MockState {
    running: bool,
    /// Stopped but not yet drained by `wait()`; still holds the device.
    stopping: bool,
    frequency: f64,
    calls: Vec<ChainCall>,
    fail_start: bool,
    fail_stop: bool,
    fail_wait: bool,
    hang_start: bool,
    hang_wait: bool,
    reject_tuning: bool,
    require_running: bool,
    wait_delay: Duration,
}

/// Counts chains that currently hold the device.
///
/// Share one probe between the TX and RX mocks; [`peak`](RunningProbe::peak)
/// then reports the largest number of chains ever holding the device at
/// the same time. A chain holds the device from a successful `start()`
/// until the `wait()` that follows its `stop()`.
#[derive(Debug, Clone, Default)]
pub struct RunningProbe {
    inner: Arc<ProbeCounters>,
}

#[derive(Debug, Default)]
struct ProbeCounters {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl RunningProbe {
    /// Create a probe with no chains running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chains holding the device right now.
    pub fn current(&self) -> usize {
        self.inner.current.load(Ordering::SeqCst)
    }

    /// Highest number of chains ever holding the device at once.
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    fn acquired(&self) {
        let now = self.inner.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn released(&self) {
        self.inner.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A [`SignalChain`] test double with call recording and failure injection.
#[derive(Debug)]
pub struct MockSignalChain {
    label: String,
    state: Arc<Mutex<MockState>>,
    probe: Option<RunningProbe>,
}

impl MockSignalChain {
    /// Create an idle mock tuned to `frequency` hertz.
    pub fn new(label: &str, frequency: f64) -> Self {
        MockSignalChain {
            label: label.to_string(),
            state: Arc::new(Mutex::new(MockState {
                frequency,
                ..MockState::default()
            })),
            probe: None,
        }
    }

    /// Report device ownership to `probe`.
    pub fn with_probe(mut self, probe: RunningProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Make every `wait()` take `delay` before completing.
    pub fn with_wait_delay(self, delay: Duration) -> Self {
        self.with_state(|s| s.wait_delay = delay);
        self
    }

    /// A handle for inspecting and steering this mock after it has been
    /// moved into the code under test.
    pub fn handle(&self) -> MockChainHandle {
        MockChainHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

#[async_trait]
impl SignalChain for MockSignalChain {
    fn label(&self) -> &str {
        &self.label
    }

    async fn start(&mut self) -> Result<()> {
        let label = self.label.clone();
        let hang = self.with_state(|s| {
            s.calls.push(ChainCall::Start);
            if s.fail_start {
                return Err(Error::Chain(format!("{label} chain failed to start")));
            }
            if s.running || s.stopping {
                return Err(Error::Chain(format!("{label} chain already running")));
            }
            s.running = true;
            Ok(s.hang_start)
        })?;
        if let Some(probe) = &self.probe {
            probe.acquired();
        }
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let label = self.label.clone();
        self.with_state(|s| {
            s.calls.push(ChainCall::Stop);
            if s.fail_stop {
                return Err(Error::Chain(format!("{label} chain failed to stop")));
            }
            if s.running {
                s.running = false;
                s.stopping = true;
            }
            Ok(())
        })
    }

    async fn wait(&mut self) -> Result<()> {
        let (hang, delay, fail) = self.with_state(|s| {
            s.calls.push(ChainCall::Wait);
            (s.hang_wait, s.wait_delay, s.fail_wait)
        });

        if hang {
            std::future::pending::<()>().await;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(Error::Chain(format!("{} chain failed to drain", self.label)));
        }

        let drained = self.with_state(|s| std::mem::take(&mut s.stopping));
        if drained {
            if let Some(probe) = &self.probe {
                probe.released();
            }
        }
        Ok(())
    }

    async fn get_frequency(&self, channel: ChannelId) -> Result<f64> {
        let label = self.label.clone();
        self.with_state(|s| {
            s.calls.push(ChainCall::GetFrequency(channel.index()));
            if s.require_running && !s.running {
                return Err(Error::Chain(format!("{label} chain queried while stopped")));
            }
            Ok(s.frequency)
        })
    }

    async fn set_frequency(&mut self, channel: ChannelId, hz: f64) -> Result<()> {
        let label = self.label.clone();
        self.with_state(|s| {
            s.calls.push(ChainCall::SetFrequency(channel.index(), hz));
            if s.reject_tuning {
                return Err(Error::InvalidParameter(format!(
                    "{label} chain rejected {hz} Hz"
                )));
            }
            if s.require_running && !s.running {
                return Err(Error::Chain(format!("{label} chain tuned while stopped")));
            }
            s.frequency = hz;
            Ok(())
        })
    }
}

/// Shared view of a [`MockSignalChain`]'s state.
#[derive(Debug, Clone)]
pub struct MockChainHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockChainHandle {
    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Every call recorded so far, in order.
    pub fn calls(&self) -> Vec<ChainCall> {
        self.with_state(|s| s.calls.clone())
    }

    /// Forget recorded calls (e.g. after startup).
    pub fn clear_calls(&self) {
        self.with_state(|s| s.calls.clear());
    }

    pub fn starts(&self) -> usize {
        self.count(|c| matches!(c, ChainCall::Start))
    }

    pub fn stops(&self) -> usize {
        self.count(|c| matches!(c, ChainCall::Stop))
    }

    pub fn waits(&self) -> usize {
        self.count(|c| matches!(c, ChainCall::Wait))
    }

    fn count(&self, pred: impl Fn(&ChainCall) -> bool) -> usize {
        self.with_state(|s| s.calls.iter().filter(|c| pred(c)).count())
    }

    /// Whether the chain is running (started and not stopped).
    pub fn is_running(&self) -> bool {
        self.with_state(|s| s.running)
    }

    /// The frequency the chain is tuned to.
    pub fn frequency(&self) -> f64 {
        self.with_state(|s| s.frequency)
    }

    /// Make `start()` fail.
    pub fn fail_start(&self, fail: bool) {
        self.with_state(|s| s.fail_start = fail);
    }

    /// Make `stop()` fail.
    pub fn fail_stop(&self, fail: bool) {
        self.with_state(|s| s.fail_stop = fail);
    }

    /// Make `wait()` fail.
    pub fn fail_wait(&self, fail: bool) {
        self.with_state(|s| s.fail_wait = fail);
    }

    /// Make `start()` open the device and then never return.
    ///
    /// The chain counts as running from the moment the call is made, the
    /// way a real flowgraph may already hold the device when a caller gives
    /// up waiting on it.
    pub fn hang_start(&self, hang: bool) {
        self.with_state(|s| s.hang_start = hang);
    }

    /// Make `wait()` never return.
    pub fn hang_wait(&self, hang: bool) {
        self.with_state(|s| s.hang_wait = hang);
    }

    /// Make `set_frequency()` reject every value.
    pub fn reject_tuning(&self, reject: bool) {
        self.with_state(|s| s.reject_tuning = reject);
    }

    /// Fail frequency reads and writes while the chain is not running.
    ///
    /// Catches callers that query a chain mid-transition.
    pub fn require_running(&self, require: bool) {
        self.with_state(|s| s.require_running = require);
    }
}
