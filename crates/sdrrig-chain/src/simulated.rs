//! Simulated signal chain.
//!
//! [`SimulatedChain`] models the lifecycle of a real flowgraph closely
//! enough to exercise the mode controller: it refuses to start twice,
//! takes a configurable time to drain after `stop()`, and rejects tuning
//! requests outside its range. No samples are produced.

use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use sdrrig_core::error::{Error, Result};
use sdrrig_core::{ChannelId, SignalChain, format_freq_mhz};
use tokio::time::Instant;

/// Default tunable range: 1 MHz to 6 GHz, typical for a wideband SDR.
const DEFAULT_RANGE: RangeInclusive<f64> = 1_000_000.0..=6_000_000_000.0;

/// Default initial frequency (14.074 MHz, FT8 on 20 m).
const DEFAULT_FREQUENCY_HZ: f64 = 14_074_000.0;

/// Default time `wait()` takes to drain a stopping chain.
const DEFAULT_SETTLE_TIME: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Running,
    /// Draining; the device is released at `until`.
    Stopping { until: Instant },
}

/// An in-process signal chain with no hardware behind it.
#[derive(Debug)]
pub struct SimulatedChain {
    label: String,
    state: RunState,
    frequencies: Vec<f64>,
    range: RangeInclusive<f64>,
    settle_time: Duration,
}

impl SimulatedChain {
    /// Start building a chain with the given log label.
    pub fn builder(label: &str) -> SimulatedChainBuilder {
        SimulatedChainBuilder::new(label)
    }

    /// Whether the chain is currently running.
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    fn channel_index(&self, channel: ChannelId) -> Result<usize> {
        let index = channel.index();
        if index < self.frequencies.len() {
            Ok(index)
        } else {
            Err(Error::InvalidParameter(format!(
                "{} chain has no channel {}",
                self.label, index
            )))
        }
    }
}

#[async_trait]
impl SignalChain for SimulatedChain {
    fn label(&self) -> &str {
        &self.label
    }

    async fn start(&mut self) -> Result<()> {
        match self.state {
            RunState::Running => Err(Error::Chain(format!("{} chain already running", self.label))),
            RunState::Stopping { .. } => Err(Error::Chain(format!(
                "{} chain is still stopping",
                self.label
            ))),
            RunState::Idle => {
                self.state = RunState::Running;
                tracing::debug!(chain = %self.label, "simulated chain started");
                Ok(())
            }
        }
    }

    async fn stop(&mut self) -> Result<()> {
        if self.state == RunState::Running {
            self.state = RunState::Stopping {
                until: Instant::now() + self.settle_time,
            };
            tracing::debug!(chain = %self.label, "simulated chain stopping");
        }
        Ok(())
    }

    /// Sleeps until the drain deadline set by `stop()`. A wait that is
    /// cancelled and retried does not start the settle time over.
    async fn wait(&mut self) -> Result<()> {
        if let RunState::Stopping { until } = self.state {
            tokio::time::sleep_until(until).await;
            self.state = RunState::Idle;
            tracing::debug!(chain = %self.label, "simulated chain stopped");
        }
        Ok(())
    }

    async fn get_frequency(&self, channel: ChannelId) -> Result<f64> {
        let index = self.channel_index(channel)?;
        Ok(self.frequencies[index])
    }

    async fn set_frequency(&mut self, channel: ChannelId, hz: f64) -> Result<()> {
        let index = self.channel_index(channel)?;
        if !self.range.contains(&hz) {
            return Err(Error::InvalidParameter(format!(
                "{} outside tunable range {} - {}",
                format_freq_mhz(hz),
                format_freq_mhz(*self.range.start()),
                format_freq_mhz(*self.range.end()),
            )));
        }
        self.frequencies[index] = hz;
        tracing::debug!(chain = %self.label, %channel, freq_hz = hz, "simulated chain retuned");
        Ok(())
    }
}

/// Fluent builder for [`SimulatedChain`].
#[derive(Debug, Clone)]
pub struct SimulatedChainBuilder {
    label: String,
    channels: usize,
    frequency: f64,
    range: RangeInclusive<f64>,
    settle_time: Duration,
}

impl SimulatedChainBuilder {
    /// Create a builder with default range, frequency, and settle time.
    pub fn new(label: &str) -> Self {
        SimulatedChainBuilder {
            label: label.to_string(),
            channels: 1,
            frequency: DEFAULT_FREQUENCY_HZ,
            range: DEFAULT_RANGE,
            settle_time: DEFAULT_SETTLE_TIME,
        }
    }

    /// Number of tunable channels (at least one).
    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Initial frequency of every channel in hertz.
    pub fn frequency(mut self, hz: f64) -> Self {
        self.frequency = hz;
        self
    }

    /// Inclusive tunable range in hertz.
    pub fn tunable_range(mut self, min_hz: f64, max_hz: f64) -> Self {
        self.range = min_hz..=max_hz;
        self
    }

    /// How long `wait()` takes after `stop()`.
    pub fn settle_time(mut self, settle_time: Duration) -> Self {
        self.settle_time = settle_time;
        self
    }

    /// Validate the configuration and build the chain in the idle state.
    pub fn build(self) -> Result<SimulatedChain> {
        if self.channels == 0 {
            return Err(Error::InvalidParameter(
                "a signal chain needs at least one channel".into(),
            ));
        }
        if self.range.is_empty() {
            return Err(Error::InvalidParameter(format!(
                "empty tunable range {} - {}",
                format_freq_mhz(*self.range.start()),
                format_freq_mhz(*self.range.end()),
            )));
        }
        if !self.range.contains(&self.frequency) {
            return Err(Error::InvalidParameter(format!(
                "initial frequency {} outside tunable range",
                format_freq_mhz(self.frequency)
            )));
        }

        Ok(SimulatedChain {
            label: self.label,
            state: RunState::Idle,
            frequencies: vec![self.frequency; self.channels],
            range: self.range,
            settle_time: self.settle_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_chain() -> SimulatedChain {
        SimulatedChain::builder("rx")
            .settle_time(Duration::ZERO)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn lifecycle_start_stop_wait() {
        let mut chain = quick_chain();
        assert!(!chain.is_running());

        chain.start().await.unwrap();
        assert!(chain.is_running());

        chain.stop().await.unwrap();
        assert!(!chain.is_running());
        chain.wait().await.unwrap();

        // Restartable after a full stop.
        chain.start().await.unwrap();
        assert!(chain.is_running());
    }

    #[tokio::test]
    async fn double_start_rejected() {
        let mut chain = quick_chain();
        chain.start().await.unwrap();
        let err = chain.start().await.unwrap_err();
        assert!(matches!(err, Error::Chain(ref msg) if msg.contains("already running")));
    }

    #[tokio::test]
    async fn start_before_wait_rejected() {
        let mut chain = quick_chain();
        chain.start().await.unwrap();
        chain.stop().await.unwrap();
        let err = chain.start().await.unwrap_err();
        assert!(matches!(err, Error::Chain(ref msg) if msg.contains("still stopping")));
    }

    #[tokio::test]
    async fn stop_and_wait_when_idle_are_noops() {
        let mut chain = quick_chain();
        chain.stop().await.unwrap();
        chain.wait().await.unwrap();
        assert!(!chain.is_running());
    }

    #[tokio::test]
    async fn wait_takes_settle_time() {
        let mut chain = SimulatedChain::builder("tx")
            .settle_time(Duration::from_millis(30))
            .build()
            .unwrap();
        chain.start().await.unwrap();
        chain.stop().await.unwrap();

        let started = tokio::time::Instant::now();
        chain.wait().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn cancelled_wait_keeps_drain_deadline() {
        let mut chain = SimulatedChain::builder("rx")
            .settle_time(Duration::from_millis(50))
            .build()
            .unwrap();
        chain.start().await.unwrap();
        chain.stop().await.unwrap();

        let early = tokio::time::timeout(Duration::from_millis(10), chain.wait()).await;
        assert!(early.is_err());
        assert!(chain.start().await.is_err());

        tokio::time::sleep(Duration::from_millis(80)).await;
        // The deadline has passed; the retry does not sleep the full settle time again.
        tokio::time::timeout(Duration::from_millis(30), chain.wait())
            .await
            .expect("wait restarted the settle time")
            .unwrap();
        chain.start().await.unwrap();
    }

    #[tokio::test]
    async fn tune_round_trip() {
        let mut chain = quick_chain();
        assert_eq!(
            chain.get_frequency(ChannelId::PRIMARY).await.unwrap(),
            DEFAULT_FREQUENCY_HZ
        );
        chain
            .set_frequency(ChannelId::PRIMARY, 7_074_000.0)
            .await
            .unwrap();
        assert_eq!(
            chain.get_frequency(ChannelId::PRIMARY).await.unwrap(),
            7_074_000.0
        );
    }

    #[tokio::test]
    async fn tune_out_of_range_rejected() {
        let mut chain = SimulatedChain::builder("rx")
            .tunable_range(1_000_000.0, 30_000_000.0)
            .build()
            .unwrap();
        let err = chain
            .set_frequency(ChannelId::PRIMARY, 144_000_000.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        assert_eq!(
            chain.get_frequency(ChannelId::PRIMARY).await.unwrap(),
            DEFAULT_FREQUENCY_HZ
        );
    }

    #[tokio::test]
    async fn unknown_channel_rejected() {
        let mut chain = quick_chain();
        assert!(matches!(
            chain.get_frequency(ChannelId::from_index(1)).await,
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            chain.set_frequency(ChannelId::from_index(1), 7e6).await,
            Err(Error::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn channels_are_independent() {
        let mut chain = SimulatedChain::builder("rx").channels(2).build().unwrap();
        chain
            .set_frequency(ChannelId::from_index(1), 3_573_000.0)
            .await
            .unwrap();
        assert_eq!(
            chain.get_frequency(ChannelId::PRIMARY).await.unwrap(),
            DEFAULT_FREQUENCY_HZ
        );
        assert_eq!(
            chain.get_frequency(ChannelId::from_index(1)).await.unwrap(),
            3_573_000.0
        );
    }

    #[test]
    fn builder_validates() {
        assert!(SimulatedChain::builder("rx").channels(0).build().is_err());
        assert!(
            SimulatedChain::builder("rx")
                .tunable_range(10.0, 1.0)
                .build()
                .is_err()
        );
        assert!(
            SimulatedChain::builder("rx")
                .frequency(500.0)
                .build()
                .is_err()
        );
    }

    #[test]
    fn label_is_reported() {
        let chain = quick_chain();
        assert_eq!(chain.label(), "rx");
    }
}
