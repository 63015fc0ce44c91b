//! Signal chain implementations for sdrrig.
//!
//! This crate provides concrete implementations of the
//! [`SignalChain`](sdrrig_core::SignalChain) trait from `sdrrig-core`.
//!
//! - [`SimulatedChain`]: an in-process chain with a tunable range and a
//!   settle delay on stop, for running the server without hardware
//!
//! # Example
//!
//! ```
//! use sdrrig_chain::SimulatedChain;
//! use sdrrig_core::{ChannelId, SignalChain};
//!
//! # async fn example() -> sdrrig_core::Result<()> {
//! let mut rx = SimulatedChain::builder("rx")
//!     .frequency(14_074_000.0)
//!     .build()?;
//!
//! rx.start().await?;
//! rx.set_frequency(ChannelId::PRIMARY, 7_074_000.0).await?;
//! rx.stop().await?;
//! rx.wait().await?;
//! # Ok(())
//! # }
//! ```

pub mod simulated;

pub use simulated::{SimulatedChain, SimulatedChainBuilder};
