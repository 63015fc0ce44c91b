//! Text protocol for rigctl-compatible clients.
//!
//! Logging programs and digital-mode applications drive the radio with
//! short, newline-terminated ASCII commands (`f`, `t 1`, `\dump_state`) and
//! expect CRLF-terminated replies. This crate is pure parsing and encoding;
//! no I/O is performed.
//!
//! # Architecture
//!
//! - [`command`] -- classify a client line into a typed [`Command`]
//! - [`protocol`] -- reply encoding and `RPRT` report codes
//! - [`capability`] -- canned introspection replies

pub mod capability;
pub mod command;
pub mod protocol;

pub use capability::CapabilityResponder;
pub use command::{Command, ParseError, parse_command};
pub use protocol::{Reply, ReportCode};
