//! sdrrig-core: Core traits, types, and error definitions for sdrrig.
//!
//! This crate defines the abstractions shared by the rig-control server and
//! the signal chains it drives. The server depends on these types without
//! knowing anything about how a particular chain talks to its hardware.
//!
//! # Key types
//!
//! - [`SignalChain`] -- one direction (transmit or receive) of the radio
//! - [`TxRxMode`] -- which chain currently owns the device
//! - [`TransceiverEvent`] -- asynchronous state change notifications
//! - [`Error`] / [`Result`] -- error handling

pub mod chain;
pub mod error;
pub mod events;
pub mod helpers;
pub mod types;

// Re-export key types at crate root for ergonomic `use sdrrig_core::*`.
pub use chain::SignalChain;
pub use error::{Error, Result};
pub use events::TransceiverEvent;
pub use helpers::{format_freq_mhz, hz_to_wire};
pub use types::*;
