//! Rig-control server for a two-chain software-defined transceiver.
//!
//! Third-party logging and digital-mode software connects over TCP and
//! speaks the rigctl text protocol. The server maps those commands onto a
//! transmit and a receive [`SignalChain`](sdrrig_core::SignalChain) that
//! share one physical device, so only one of them may run at a time.
//!
//! # Architecture
//!
//! - [`controller`] -- [`ModeController`], the TX/RX state machine that owns
//!   both chains and serializes every transition behind one lock
//! - [`dispatch`] -- maps a parsed command to its handler
//! - [`session`] -- per-connection read/dispatch/write loop
//! - [`listener`] -- accept loop, session supervision, and shutdown
//! - [`config`] -- bind address and limits
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sdrrig_chain::SimulatedChain;
//! use sdrrig_server::{Listener, ModeController, ServerConfig};
//!
//! # async fn example() -> sdrrig_core::Result<()> {
//! let config = ServerConfig::default();
//! let tx = SimulatedChain::builder("tx").build()?;
//! let rx = SimulatedChain::builder("rx").build()?;
//!
//! let controller =
//!     ModeController::start(Box::new(tx), Box::new(rx), config.controller_options()).await?;
//! let listener = Listener::bind(&config, Arc::new(controller)).await?;
//! listener.run().await
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod listener;
pub mod session;

pub use config::ServerConfig;
pub use controller::{ModeController, ModeControllerOptions};
pub use dispatch::{Dispatcher, Outcome, SessionControl};
pub use listener::Listener;
pub use session::Session;
