//! Command dispatch.
//!
//! [`Dispatcher`] turns one request line into one [`Reply`]. Parsing,
//! canned introspection replies, and calls into the [`ModeController`]
//! all happen here; the session only moves bytes.

use std::sync::Arc;

use tracing::{debug, warn};

use sdrrig_core::hz_to_wire;
use sdrrig_rigctl::{CapabilityResponder, Command, Reply, ReportCode, parse_command};

use crate::controller::ModeController;

/// Whether the session continues after a reply is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    Close,
}

/// The result of handling one request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub reply: Reply,
    pub control: SessionControl,
}

impl Outcome {
    /// A reply after which the session keeps reading.
    pub fn reply(reply: Reply) -> Self {
        Outcome {
            reply,
            control: SessionControl::Continue,
        }
    }

    fn close(reply: Reply) -> Self {
        Outcome {
            reply,
            control: SessionControl::Close,
        }
    }
}

/// Maps parsed commands onto the controller and the canned responder.
///
/// Cheap to clone; every session gets its own.
#[derive(Clone)]
pub struct Dispatcher {
    controller: Arc<ModeController>,
    responder: CapabilityResponder,
}

impl Dispatcher {
    pub fn new(controller: Arc<ModeController>) -> Self {
        Dispatcher {
            controller,
            responder: CapabilityResponder::new(),
        }
    }

    /// Parse and execute one request line.
    ///
    /// Parse failures of every kind are answered with `RPRT -1`.
    pub async fn handle_line(&self, line: &str) -> Outcome {
        match parse_command(line) {
            Ok(command) => self.execute(command).await,
            Err(e) => {
                debug!(line, error = %e, "rejected request");
                Outcome::reply(Reply::error())
            }
        }
    }

    /// Execute an already parsed command.
    pub async fn execute(&self, command: Command) -> Outcome {
        debug!(command = command.name(), "executing");
        let responder = &self.responder;
        match command {
            Command::GetFrequency => Outcome::reply(self.get_frequency().await),
            Command::SetFrequency(hz) => Outcome::reply(self.set_frequency(hz).await),
            Command::DumpState => Outcome::reply(responder.dump_state()),
            Command::GetPowerStat => Outcome::reply(responder.power_status()),
            Command::CheckVfo => Outcome::reply(responder.vfo_check()),
            Command::GetSplit => Outcome::reply(responder.split_status()),
            Command::SetSplit => Outcome::reply(responder.split_rejection()),
            Command::GetPtt => Outcome::reply(self.get_ptt().await),
            Command::SetPtt(on) => Outcome::reply(self.set_ptt(on).await),
            Command::Quit => Outcome::close(self.quit().await),
            Command::Probe => Outcome::reply(Reply::Report(ReportCode::Unavailable)),
        }
    }

    async fn get_frequency(&self) -> Reply {
        let hz = match self.controller.get_frequency().await {
            Ok(hz) => hz,
            Err(e) => {
                warn!(error = %e, "frequency read failed");
                return Reply::error();
            }
        };
        match hz_to_wire(hz) {
            Some(wire) => Reply::Value(wire.to_string()),
            None => {
                warn!(hz, "chain reported an unrepresentable frequency");
                Reply::error()
            }
        }
    }

    async fn set_frequency(&self, hz: f64) -> Reply {
        match self.controller.set_frequency(hz).await {
            Ok(()) => Reply::ok(),
            Err(e) => {
                warn!(hz, error = %e, "retune failed");
                Reply::error()
            }
        }
    }

    async fn get_ptt(&self) -> Reply {
        match self.controller.mode().await {
            Ok(mode) if mode.is_transmit() => Reply::Value("1".into()),
            Ok(_) => Reply::Value("0".into()),
            Err(e) => {
                warn!(error = %e, "mode query failed");
                Reply::error()
            }
        }
    }

    async fn set_ptt(&self, on: bool) -> Reply {
        match self.controller.set_ptt(on).await {
            Ok(()) => Reply::ok(),
            Err(e) => {
                warn!(ptt = on, error = %e, retryable = e.is_retryable(), "ptt change failed");
                Reply::error()
            }
        }
    }

    /// Leave the radio receiving before the client goes away.
    async fn quit(&self) -> Reply {
        match self.controller.set_ptt(false).await {
            Ok(()) => Reply::ok(),
            Err(e) => {
                warn!(error = %e, "could not return to receive on quit");
                Reply::error()
            }
        }
    }
}
