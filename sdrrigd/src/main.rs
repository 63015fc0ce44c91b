// sdrrigd -- rig-control daemon for a two-chain SDR transceiver.
//
// Exposes a rigctl-compatible TCP endpoint so logging and digital-mode
// software can read and set frequency and key the transmitter.
//
// Usage:
//   sdrrigd
//   sdrrigd --host 0.0.0.0 --port 4575
//   sdrrigd --rx-freq 7074000 --tx-freq 7074000 --log-filter sdrrig_server=debug,info
//   sdrrigd --log-format json

mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use sdrrig_chain::SimulatedChain;
use sdrrig_core::{TransceiverEvent, format_freq_mhz};
use sdrrig_server::config::{DEFAULT_HOST, DEFAULT_PORT};
use sdrrig_server::{Listener, ModeController, ServerConfig};

use telemetry::LogFormat;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// rigctl-compatible rig-control daemon.
#[derive(Parser, Debug)]
#[command(name = "sdrrigd", version, about)]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// TCP port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Upper bound on each chain start, stop, or drain, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    transition_timeout_ms: u64,

    /// Initial receive frequency in Hz.
    #[arg(long, default_value_t = 14_074_000.0)]
    rx_freq: f64,

    /// Initial transmit frequency in Hz.
    #[arg(long, default_value_t = 14_074_000.0)]
    tx_freq: f64,

    /// Lowest tunable frequency in Hz.
    #[arg(long, default_value_t = 1_000_000.0)]
    min_freq: f64,

    /// Highest tunable frequency in Hz.
    #[arg(long, default_value_t = 6_000_000_000.0)]
    max_freq: f64,

    /// Time a stopped chain takes to drain, in milliseconds.
    #[arg(long, default_value_t = 50)]
    settle_ms: u64,

    /// Log filter directives (EnvFilter syntax).
    #[arg(long, default_value = "info")]
    log_filter: String,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        ServerConfig::default()
            .host(&self.host)
            .port(self.port)
            .transition_timeout(Duration::from_millis(self.transition_timeout_ms))
    }

    fn chain(&self, label: &str, freq: f64) -> Result<SimulatedChain> {
        SimulatedChain::builder(label)
            .frequency(freq)
            .tunable_range(self.min_freq, self.max_freq)
            .settle_time(Duration::from_millis(self.settle_ms))
            .build()
            .with_context(|| format!("invalid {label} chain settings"))
    }
}

// ---------------------------------------------------------------------------
// Event logging
// ---------------------------------------------------------------------------

async fn log_events(controller: Arc<ModeController>) {
    let mut events = controller.subscribe();
    drop(controller);
    loop {
        match events.recv().await {
            Ok(TransceiverEvent::ModeChanged { mode }) => info!(%mode, "mode changed"),
            Ok(TransceiverEvent::FrequencyChanged { mode, freq_hz }) => {
                info!(%mode, freq = %format_freq_mhz(freq_hz), "frequency changed")
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "event log fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::initialise(&cli.log_filter, cli.log_format)?;

    let config = cli.server_config();
    config.validate().context("invalid server settings")?;

    let tx = cli.chain("tx", cli.tx_freq)?;
    let rx = cli.chain("rx", cli.rx_freq)?;

    let controller = ModeController::start(Box::new(tx), Box::new(rx), config.controller_options())
        .await
        .context("radio self-check failed")?;
    let controller = Arc::new(controller);

    let listener = Listener::bind(&config, Arc::clone(&controller))
        .await
        .with_context(|| format!("failed to listen on {}", config.bind_address()))?;
    info!(address = %listener.local_addr()?, "sdrrigd ready");

    let events = tokio::spawn(log_events(Arc::clone(&controller)));
    drop(controller);

    let shutdown = listener.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for interrupt");
            return;
        }
        info!("interrupt received, shutting down");
        shutdown.cancel();
    });

    let result = listener.run().await.context("rig shutdown failed");
    events.abort();
    result
}
