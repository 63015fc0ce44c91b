//! Core types used throughout sdrrig.

use std::fmt;

/// Which signal chain currently owns the radio.
///
/// The device has a single hardware context, so exactly one direction is
/// active at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TxRxMode {
    /// The receive chain is running.
    #[default]
    Rx,
    /// The transmit chain is running (PTT keyed).
    Tx,
}

impl TxRxMode {
    /// Map a PTT state onto a mode: `true` keys the transmitter.
    pub fn from_ptt(on: bool) -> Self {
        if on { TxRxMode::Tx } else { TxRxMode::Rx }
    }

    /// Whether this mode corresponds to PTT on.
    pub fn is_transmit(&self) -> bool {
        matches!(self, TxRxMode::Tx)
    }
}

impl fmt::Display for TxRxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxRxMode::Rx => "RX",
            TxRxMode::Tx => "TX",
        };
        write!(f, "{s}")
    }
}

/// Tunable channel index within a signal chain.
///
/// Chains may expose several channels; the rig-control surface only ever
/// addresses the first one, which the protocol calls VFOA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(usize);

impl ChannelId {
    /// Channel 0, presented to clients as VFOA.
    pub const PRIMARY: ChannelId = ChannelId(0);

    /// Create a `ChannelId` from a raw index.
    pub fn from_index(index: usize) -> Self {
        ChannelId(index)
    }

    /// Return the raw numeric index of this channel.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "VFOA"),
            n => write!(f, "CH{n}"),
        }
    }
}
