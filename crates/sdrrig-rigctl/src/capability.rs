//! Canned replies for introspection commands.
//!
//! Clients probe the radio with `\dump_state`, `\get_powerstat`, and
//! `\chk_vfo` when they connect, and parse the answers structurally. These
//! replies describe a generic wideband SDR and are fixed literals; they do
//! not reflect live chain state.

use crate::protocol::Reply;

/// Full `\dump_state` report: protocol version, rig model, ITU region,
/// RX/TX frequency ranges, tuning steps, filter bandwidths per mode, then
/// level and function capability masks.
pub const DUMP_STATE: &str = concat!(
    "0\r\n",
    "2\r\n",
    "1\r\n",
    "0.000000 10000000000.000000 0xef -1 -1 0x1 0x0\r\n",
    "0 0 0 0 0 0 0\r\n",
    "0 0 0 0 0 0 0\r\n",
    "0xef 1\r\n",
    "0xef 0\r\n",
    "0 0\r\n",
    "0x82 500\r\n",
    "0x82 200\r\n",
    "0x82 2000\r\n",
    "0x21 10000\r\n",
    "0x21 5000\r\n",
    "0x21 20000\r\n",
    "0x0c 2700\r\n",
    "0x0c 1400\r\n",
    "0x0c 3900\r\n",
    "0x40 160000\r\n",
    "0x40 120000\r\n",
    "0x40 200000\r\n",
    "0 0\r\n",
    "0\r\n",
    "0\r\n",
    "0\r\n",
    "0\r\n",
    "0\r\n",
    "0\r\n",
    "0\r\n",
    "0\r\n",
    "0x40000020\r\n",
    "0x20\r\n",
    "0\r\n",
    "0\r\n",
);

/// `\get_powerstat`: the radio is always reported as powered on.
pub const POWER_STATUS: &str = "1\r\n";

/// `\chk_vfo`: VFO mode is off.
pub const VFO_CHECK: &str = "CHKVFO 0\r\n";

/// `s`: split off, transmitting on VFOA.
pub const SPLIT_STATUS: &str = "0\r\nVFOA\r\n";

/// `s vfoa 0 vfoa`: split is not supported; clients expect two report lines.
pub const SPLIT_REJECTION: &str = "RPRT -1\r\nRPRT -1\r\n";

/// Answers introspection commands from static text.
///
/// None of these replies depend on the live radio; clients parse them
/// structurally, so they are returned byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityResponder;

impl CapabilityResponder {
    /// Create a responder.
    pub fn new() -> Self {
        CapabilityResponder
    }

    /// `\dump_state`: the full capability block.
    pub fn dump_state(&self) -> Reply {
        Reply::Canned(DUMP_STATE)
    }

    /// `\get_powerstat`: always powered on.
    pub fn power_status(&self) -> Reply {
        Reply::Canned(POWER_STATUS)
    }

    /// `\chk_vfo`: VFO mode off.
    pub fn vfo_check(&self) -> Reply {
        Reply::Canned(VFO_CHECK)
    }

    /// `s`: split off on VFOA.
    pub fn split_status(&self) -> Reply {
        Reply::Canned(SPLIT_STATUS)
    }

    /// `s vfoa 0 vfoa`: the two-line rejection.
    pub fn split_rejection(&self) -> Reply {
        Reply::Canned(SPLIT_REJECTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_state_shape() {
        assert!(DUMP_STATE.ends_with("\r\n"));
        let lines: Vec<&str> = DUMP_STATE.split_terminator("\r\n").collect();
        assert_eq!(lines.len(), 34);
        assert_eq!(lines[0], "0");
        assert_eq!(lines[1], "2");
        assert_eq!(lines[3], "0.000000 10000000000.000000 0xef -1 -1 0x1 0x0");
        assert_eq!(lines[30], "0x40000020");
        assert_eq!(lines[31], "0x20");
        // No bare LF anywhere: every line break is CRLF.
        assert_eq!(DUMP_STATE.matches('\n').count(), 34);
        assert_eq!(DUMP_STATE.matches("\r\n").count(), 34);
    }

    #[test]
    fn dump_state_filter_table() {
        let lines: Vec<&str> = DUMP_STATE.split_terminator("\r\n").collect();
        assert_eq!(
            &lines[9..21],
            &[
                "0x82 500",
                "0x82 200",
                "0x82 2000",
                "0x21 10000",
                "0x21 5000",
                "0x21 20000",
                "0x0c 2700",
                "0x0c 1400",
                "0x0c 3900",
                "0x40 160000",
                "0x40 120000",
                "0x40 200000",
            ]
        );
    }

    #[test]
    fn introspection_replies() {
        let responder = CapabilityResponder::new();
        assert_eq!(responder.dump_state(), Reply::Canned(DUMP_STATE));
        assert_eq!(responder.power_status().encode(), b"1\r\n");
        assert_eq!(responder.vfo_check().encode(), b"CHKVFO 0\r\n");
        assert_eq!(responder.split_status().encode(), b"0\r\nVFOA\r\n");
        assert_eq!(
            responder.split_rejection().encode(),
            b"RPRT -1\r\nRPRT -1\r\n"
        );
    }

    #[test]
    fn split_rejection_is_an_error_reply() {
        let responder = CapabilityResponder::new();
        assert!(responder.split_rejection().is_error());
        assert!(!responder.split_status().is_error());
        assert!(!responder.dump_state().is_error());
    }
}
