//! sdrrig-test-harness: Test utilities and mock signal chains for sdrrig.
//!
//! This crate provides [`MockSignalChain`] for deterministic testing of the
//! mode controller without a real signal-processing engine, [`RunningProbe`]
//! for checking that two chains never run at once, and [`RigctlClient`] for
//! driving a running server over TCP.

pub mod client;
pub mod mock_chain;

pub use client::RigctlClient;
pub use mock_chain::{ChainCall, MockChainHandle, MockSignalChain, RunningProbe};
