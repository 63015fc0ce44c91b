//! TX/RX mode controller.
//!
//! [`ModeController`] owns both signal chains and records which one is
//! active. The transmit and receive chains share a single device context,
//! so switching direction always stops the outgoing chain, waits for it to
//! drain, and only then starts the incoming one.
//!
//! Every operation, including plain frequency reads, takes the same lock,
//! and the lock is held for the whole stop/wait/start sequence. A client
//! asking for the frequency while another client keys the transmitter
//! therefore sees either the receive chain before the switch or the
//! transmit chain after it, never a chain that is halfway stopped.
//!
//! # Startup
//!
//! [`ModeController::start`] briefly starts the transmit chain to prove the
//! device can be opened for transmit, then switches to receive. The
//! controller only exists once this self-check has passed.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, warn};

use sdrrig_core::error::{Error, Result};
use sdrrig_core::{ChannelId, SignalChain, TransceiverEvent, TxRxMode, format_freq_mhz};

/// Broadcast channel capacity for event subscribers.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Tunables for [`ModeController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeControllerOptions {
    /// Bound on each individual chain call (start, stop, wait, tune).
    pub transition_timeout: Duration,
}

impl Default for ModeControllerOptions {
    fn default() -> Self {
        ModeControllerOptions {
            transition_timeout: crate::config::DEFAULT_TRANSITION_TIMEOUT,
        }
    }
}

/// Everything guarded by the controller lock.
struct Radio {
    mode: TxRxMode,
    tx: Box<dyn SignalChain>,
    rx: Box<dyn SignalChain>,
    released: bool,
}

impl Radio {
    fn chain(&self, mode: TxRxMode) -> &dyn SignalChain {
        match mode {
            TxRxMode::Tx => self.tx.as_ref(),
            TxRxMode::Rx => self.rx.as_ref(),
        }
    }

    fn chain_mut(&mut self, mode: TxRxMode) -> &mut dyn SignalChain {
        match mode {
            TxRxMode::Tx => self.tx.as_mut(),
            TxRxMode::Rx => self.rx.as_mut(),
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.released {
            Err(Error::ShutDown)
        } else {
            Ok(())
        }
    }
}

/// Serialized owner of the transmit and receive chains.
///
/// Shared between sessions behind an `Arc`; all methods take `&self`.
pub struct ModeController {
    radio: Mutex<Radio>,
    options: ModeControllerOptions,
    event_tx: broadcast::Sender<TransceiverEvent>,
}

impl ModeController {
    /// Take ownership of both chains and run the startup self-check.
    ///
    /// On success the receive chain is running and the transmit chain is
    /// stopped. Any failure is reported as [`Error::Startup`].
    pub async fn start(
        tx: Box<dyn SignalChain>,
        rx: Box<dyn SignalChain>,
        options: ModeControllerOptions,
    ) -> Result<Self> {
        let mut radio = Radio {
            mode: TxRxMode::Tx,
            tx,
            rx,
            released: false,
        };
        let timeout = options.transition_timeout;

        let tx_label = radio.tx.label().to_string();
        bounded(timeout, radio.tx.start())
            .await
            .map_err(|e| Error::Startup(format!("{tx_label} chain did not start: {e}")))?;
        info!("transmit chain started for self-check");

        transition(&mut radio, TxRxMode::Rx, timeout)
            .await
            .map_err(|e| Error::Startup(e.to_string()))?;
        info!("startup self-check complete, receiving");

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(ModeController {
            radio: Mutex::new(radio),
            options,
            event_tx,
        })
    }

    /// The mode currently in effect.
    pub async fn mode(&self) -> Result<TxRxMode> {
        let radio = self.radio.lock().await;
        radio.ensure_live()?;
        Ok(radio.mode)
    }

    /// Key (`true`) or unkey (`false`) the transmitter.
    ///
    /// Returns once the switch has fully completed. Requesting the mode
    /// that is already active succeeds without touching either chain. On
    /// failure the previously recorded mode is kept.
    pub async fn set_ptt(&self, on: bool) -> Result<()> {
        let target = TxRxMode::from_ptt(on);
        let mut radio = self.radio.lock().await;
        radio.ensure_live()?;

        if radio.mode == target {
            debug!(mode = %target, "already in requested mode");
            return Ok(());
        }

        transition(&mut radio, target, self.options.transition_timeout).await?;
        let _ = self.event_tx.send(TransceiverEvent::ModeChanged { mode: target });
        Ok(())
    }

    /// Read the active chain's primary channel frequency in hertz.
    pub async fn get_frequency(&self) -> Result<f64> {
        let radio = self.radio.lock().await;
        radio.ensure_live()?;
        let chain = radio.chain(radio.mode);
        bounded(
            self.options.transition_timeout,
            chain.get_frequency(ChannelId::PRIMARY),
        )
        .await
    }

    /// Retune the active chain's primary channel.
    pub async fn set_frequency(&self, hz: f64) -> Result<()> {
        let mut radio = self.radio.lock().await;
        radio.ensure_live()?;
        let mode = radio.mode;
        let chain = radio.chain_mut(mode);
        bounded(
            self.options.transition_timeout,
            chain.set_frequency(ChannelId::PRIMARY, hz),
        )
        .await?;

        debug!(mode = %mode, freq = %format_freq_mhz(hz), "retuned active chain");
        let _ = self
            .event_tx
            .send(TransceiverEvent::FrequencyChanged { mode, freq_hz: hz });
        Ok(())
    }

    /// Stop whichever chain is active and release the device.
    ///
    /// Subsequent calls on this controller fail with [`Error::ShutDown`].
    /// Calling `shutdown` again is a no-op.
    pub async fn shutdown(&self) -> Result<()> {
        let mut radio = self.radio.lock().await;
        if radio.released {
            return Ok(());
        }
        radio.released = true;

        let mode = radio.mode;
        let timeout = self.options.transition_timeout;
        let chain = radio.chain_mut(mode);
        bounded(timeout, chain.stop()).await?;
        bounded(timeout, chain.wait()).await?;
        info!(mode = %mode, "active chain stopped, radio released");
        Ok(())
    }

    /// Subscribe to mode and frequency change events.
    pub fn subscribe(&self) -> broadcast::Receiver<TransceiverEvent> {
        self.event_tx.subscribe()
    }
}

/// Run one chain call with an upper bound on its duration.
async fn bounded<T>(timeout: Duration, op: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(timeout, op)
        .await
        .map_err(|_| Error::Timeout)?
}

/// Best-effort stop and drain of a chain whose start failed.
///
/// Returns `false` if the chain may still hold the device.
async fn release(chain: &mut dyn SignalChain, timeout: Duration) -> bool {
    let label = chain.label().to_string();
    let stopped = match bounded(timeout, chain.stop()).await {
        Ok(()) => bounded(timeout, chain.wait()).await,
        Err(e) => Err(e),
    };
    match stopped {
        Ok(()) => true,
        Err(e) => {
            error!(chain = %label, error = %e, "could not release failed chain, radio idle");
            false
        }
    }
}

fn transition_error(target: TxRxMode, source: Error) -> Error {
    Error::Transition {
        target,
        source: Box::new(source),
    }
}

/// Stop the outgoing chain, wait for it to drain, start the incoming one.
///
/// `radio.mode` is only updated after the incoming chain has started. If
/// the incoming chain fails to start it is stopped and drained, since a
/// start that timed out may already hold the device. Only once that
/// succeeds, and only if the outgoing chain was the receiver, is the
/// receiver restarted. The transmitter is never re-keyed on the
/// controller's own initiative.
async fn transition(radio: &mut Radio, target: TxRxMode, timeout: Duration) -> Result<()> {
    let outgoing = radio.mode;
    if outgoing == target {
        return Ok(());
    }
    info!(from = %outgoing, to = %target, "switching active chain");

    bounded(timeout, radio.chain_mut(outgoing).stop())
        .await
        .map_err(|e| transition_error(target, e))?;
    bounded(timeout, radio.chain_mut(outgoing).wait())
        .await
        .map_err(|e| transition_error(target, e))?;

    if let Err(e) = bounded(timeout, radio.chain_mut(target).start()).await {
        error!(to = %target, error = %e, "incoming chain failed to start");
        let released = release(radio.chain_mut(target), timeout).await;
        if released && outgoing == TxRxMode::Rx {
            match bounded(timeout, radio.chain_mut(outgoing).start()).await {
                Ok(()) => warn!("receive chain restored after failed switch"),
                Err(restore) => {
                    error!(error = %restore, "could not restore receive chain, radio idle")
                }
            }
        }
        return Err(transition_error(target, e));
    }

    radio.mode = target;
    info!(mode = %target, "active chain switched");
    Ok(())
}
