//! Asynchronous transceiver event types.
//!
//! Events are emitted by the mode controller through a
//! `tokio::sync::broadcast` channel whenever the radio's state changes.
//! Slow consumers may miss events; the controller never blocks on them.

use crate::types::TxRxMode;

/// An event emitted when radio state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum TransceiverEvent {
    /// The active chain changed (PTT transition completed).
    ModeChanged {
        /// The mode now in effect.
        mode: TxRxMode,
    },

    /// The active chain was retuned.
    FrequencyChanged {
        /// Which chain was retuned.
        mode: TxRxMode,
        /// New frequency in hertz.
        freq_hz: f64,
    },
}
