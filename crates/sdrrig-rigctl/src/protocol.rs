//! Reply encoding for the rigctl text protocol.
//!
//! Every reply line ends in CRLF. Commands that only succeed or fail
//! answer with a report line, `RPRT <code>`, where `0` is success and
//! negative values are error codes.

use std::borrow::Cow;

/// The line terminator appended to every reply line.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Numeric code carried by an `RPRT` report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportCode {
    /// `RPRT 0`: the command succeeded.
    Ok,
    /// `RPRT -1`: invalid parameter or command, or the radio refused.
    InvalidParameter,
    /// `RPRT -11`: feature not available. Only the `v` probe reports this.
    Unavailable,
}

impl ReportCode {
    /// The signed code written after `RPRT`.
    pub fn code(&self) -> i32 {
        match self {
            ReportCode::Ok => 0,
            ReportCode::InvalidParameter => -1,
            ReportCode::Unavailable => -11,
        }
    }
}

/// One complete reply to one client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A single `RPRT <code>` line.
    Report(ReportCode),
    /// A single value line, e.g. a frequency or PTT state.
    Value(String),
    /// Pre-formatted text that already carries its CRLF terminators.
    Canned(&'static str),
}

impl Reply {
    /// `RPRT 0`.
    pub fn ok() -> Self {
        Reply::Report(ReportCode::Ok)
    }

    /// `RPRT -1`, the generic error reply.
    pub fn error() -> Self {
        Reply::Report(ReportCode::InvalidParameter)
    }

    /// The reply text exactly as it goes on the wire.
    pub fn as_text(&self) -> Cow<'static, str> {
        match self {
            Reply::Report(code) => Cow::Owned(format!("RPRT {}{LINE_TERMINATOR}", code.code())),
            Reply::Value(value) => Cow::Owned(format!("{value}{LINE_TERMINATOR}")),
            Reply::Canned(text) => Cow::Borrowed(text),
        }
    }

    /// Encode the reply into bytes ready to write to the socket.
    pub fn encode(&self) -> Vec<u8> {
        self.as_text().into_owned().into_bytes()
    }

    /// Whether this reply reports a failure to the client.
    pub fn is_error(&self) -> bool {
        match self {
            Reply::Report(code) => *code != ReportCode::Ok,
            Reply::Value(_) => false,
            Reply::Canned(text) => text.starts_with("RPRT -"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_codes() {
        assert_eq!(ReportCode::Ok.code(), 0);
        assert_eq!(ReportCode::InvalidParameter.code(), -1);
        assert_eq!(ReportCode::Unavailable.code(), -11);
    }

    #[test]
    fn encode_ok() {
        assert_eq!(Reply::ok().encode(), b"RPRT 0\r\n");
    }

    #[test]
    fn encode_error() {
        assert_eq!(Reply::error().encode(), b"RPRT -1\r\n");
    }

    #[test]
    fn encode_unavailable() {
        assert_eq!(
            Reply::Report(ReportCode::Unavailable).encode(),
            b"RPRT -11\r\n"
        );
    }

    #[test]
    fn encode_value() {
        assert_eq!(Reply::Value("14074000".into()).encode(), b"14074000\r\n");
    }

    #[test]
    fn encode_canned_passes_through() {
        assert_eq!(Reply::Canned("0\r\nVFOA\r\n").encode(), b"0\r\nVFOA\r\n");
    }

    #[test]
    fn error_classification() {
        assert!(!Reply::ok().is_error());
        assert!(Reply::error().is_error());
        assert!(Reply::Report(ReportCode::Unavailable).is_error());
        assert!(!Reply::Value("0".into()).is_error());
        assert!(Reply::Canned("RPRT -1\r\nRPRT -1\r\n").is_error());
        assert!(!Reply::Canned("CHKVFO 0\r\n").is_error());
    }
}
