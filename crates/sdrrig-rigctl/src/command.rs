//! Command-line classification.
//!
//! Each client line is trimmed, lowercased, and split on whitespace; the
//! resulting token sequence maps onto one [`Command`] or a [`ParseError`].
//! `vfoa` may appear as an explicit VFO argument wherever a rigctl client
//! would send one, since only a single VFO is modeled.
//!
//! | line                          | command                          |
//! |-------------------------------|----------------------------------|
//! | `f`, `f vfoa`                 | [`Command::GetFrequency`]        |
//! | `f <hz>`, `f vfoa <hz>`       | [`Command::SetFrequency`]        |
//! | `\dump_state`                 | [`Command::DumpState`]           |
//! | `\get_powerstat`              | [`Command::GetPowerStat`]        |
//! | `\chk_vfo`                    | [`Command::CheckVfo`]            |
//! | `s`, `s vfoa`                 | [`Command::GetSplit`]            |
//! | `s vfoa 0 vfoa`               | [`Command::SetSplit`]            |
//! | `t`, `t vfoa`                 | [`Command::GetPtt`]              |
//! | `t 1`, `t vfoa 1`             | [`Command::SetPtt`]`(true)`      |
//! | `t 0`, `t vfoa 0`             | [`Command::SetPtt`]`(false)`     |
//! | `q`                           | [`Command::Quit`]                |
//! | `v`                           | [`Command::Probe`]               |

/// A parsed client request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Read the active chain's frequency.
    GetFrequency,
    /// Retune the active chain, in hertz.
    SetFrequency(f64),
    /// Full capability report.
    DumpState,
    /// Power status query.
    GetPowerStat,
    /// VFO-mode check.
    CheckVfo,
    /// Split state query.
    GetSplit,
    /// Split enable request. Never supported.
    SetSplit,
    /// PTT state query.
    GetPtt,
    /// Key (`true`) or unkey (`false`) the transmitter.
    SetPtt(bool),
    /// End the session, leaving the radio in receive.
    Quit,
    /// Current-VFO probe. Never supported.
    Probe,
}

impl Command {
    /// The rigctl long name of this command, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetFrequency => "get_freq",
            Command::SetFrequency(_) => "set_freq",
            Command::DumpState => "dump_state",
            Command::GetPowerStat => "get_powerstat",
            Command::CheckVfo => "chk_vfo",
            Command::GetSplit => "get_split_vfo",
            Command::SetSplit => "set_split_vfo",
            Command::GetPtt => "get_ptt",
            Command::SetPtt(_) => "set_ptt",
            Command::Quit => "quit",
            Command::Probe => "get_vfo",
        }
    }
}

/// Why a client line could not be turned into a [`Command`].
///
/// All variants are answered with the same generic error reply; they are
/// kept distinct for logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line was blank after trimming.
    #[error("empty command line")]
    Empty,

    /// The line matched no known command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// An `f` command with the wrong number or arrangement of arguments.
    #[error("malformed frequency command: {0}")]
    MalformedFrequency(String),

    /// The frequency argument was not a usable number of hertz.
    #[error("invalid frequency {value:?}: {reason}")]
    InvalidFrequency {
        /// The offending argument text.
        value: String,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// Classify one line of client input.
///
/// Matching is case-insensitive and ignores surrounding and repeated
/// whitespace.
///
/// # Examples
///
/// ```
/// use sdrrig_rigctl::command::{Command, parse_command};
///
/// assert_eq!(parse_command("F VFOA"), Ok(Command::GetFrequency));
/// assert_eq!(parse_command("f 7074000"), Ok(Command::SetFrequency(7_074_000.0)));
/// assert_eq!(parse_command("t 1"), Ok(Command::SetPtt(true)));
/// assert!(parse_command("f abc").is_err());
/// ```
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let lowered = line.to_ascii_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();

    match tokens.as_slice() {
        ["f"] | ["f", "vfoa"] => Ok(Command::GetFrequency),
        ["f", value] | ["f", "vfoa", value] => parse_frequency(value).map(Command::SetFrequency),
        ["f", ..] => Err(ParseError::MalformedFrequency(line.to_string())),

        ["\\dump_state"] => Ok(Command::DumpState),
        ["\\get_powerstat"] => Ok(Command::GetPowerStat),
        ["\\chk_vfo"] => Ok(Command::CheckVfo),

        ["s"] | ["s", "vfoa"] => Ok(Command::GetSplit),
        ["s", "vfoa", "0", "vfoa"] => Ok(Command::SetSplit),

        ["t"] | ["t", "vfoa"] => Ok(Command::GetPtt),
        ["t", "1"] | ["t", "vfoa", "1"] => Ok(Command::SetPtt(true)),
        ["t", "0"] | ["t", "vfoa", "0"] => Ok(Command::SetPtt(false)),

        ["q"] => Ok(Command::Quit),
        ["v"] => Ok(Command::Probe),

        _ => Err(ParseError::UnknownCommand(line.to_string())),
    }
}

/// Parse a frequency argument in hertz.
///
/// Accepts anything Rust parses as `f64` (`7074000`, `7.074e6`) as long as
/// the result is finite and not negative.
fn parse_frequency(value: &str) -> Result<f64, ParseError> {
    let hz: f64 = value.parse().map_err(|_| ParseError::InvalidFrequency {
        value: value.to_string(),
        reason: "not a number",
    })?;

    if !hz.is_finite() {
        return Err(ParseError::InvalidFrequency {
            value: value.to_string(),
            reason: "not finite",
        });
    }
    if hz < 0.0 {
        return Err(ParseError::InvalidFrequency {
            value: value.to_string(),
            reason: "negative",
        });
    }

    Ok(hz)
}
