//! Error types for sdrrig.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Signal chain failures, mode transition
//! failures, and connection-level errors are all captured here.

use crate::types::TxRxMode;

/// The error type for all sdrrig operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A signal chain reported a failure (device busy, flowgraph error).
    #[error("signal chain error: {0}")]
    Chain(String),

    /// A bounded chain operation did not complete in time.
    ///
    /// This typically means the device is wedged while stopping. The
    /// operation can be retried once the device recovers.
    #[error("timeout waiting for signal chain")]
    Timeout,

    /// An invalid parameter was passed to a chain or controller operation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A switch between transmit and receive failed.
    ///
    /// The controller keeps its previously recorded mode when this is
    /// returned; it never guesses which chain ended up running.
    #[error("transition to {target} failed: {source}")]
    Transition {
        /// The mode the controller was trying to reach.
        target: TxRxMode,
        /// The chain error that aborted the transition.
        #[source]
        source: Box<Error>,
    },

    /// The startup self-check could not bring the radio into receive mode.
    #[error("startup self-check failed: {0}")]
    Startup(String),

    /// The controller has released the radio and accepts no more commands.
    #[error("controller shut down")]
    ShutDown,

    /// The client connection was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether resending the same command may succeed.
    ///
    /// Timeouts are transient; every other failure needs operator action
    /// or a different request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout => true,
            Error::Transition { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
