//! Server configuration.

use std::time::Duration;

use sdrrig_core::error::{Error, Result};

use crate::controller::ModeControllerOptions;

/// Default bind host: loopback only.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 4575;

/// Default bound on each chain start/stop/wait during a transition.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default longest command line a session buffers before discarding it.
pub const DEFAULT_MAX_LINE_LEN: usize = 1024;

/// Settings for the rig-control listener and its sessions.
///
/// All settings have defaults, so the simplest usage is
/// `ServerConfig::default()`.
///
/// ```
/// use std::time::Duration;
/// use sdrrig_server::ServerConfig;
///
/// let config = ServerConfig::default()
///     .host("0.0.0.0")
///     .port(4532)
///     .transition_timeout(Duration::from_secs(2));
/// assert_eq!(config.bind_address(), "0.0.0.0:4532");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    host: String,
    port: u16,
    transition_timeout: Duration,
    max_line_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            transition_timeout: DEFAULT_TRANSITION_TIMEOUT,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl ServerConfig {
    /// Host name or address to bind.
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// TCP port to bind; `0` picks an ephemeral port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Bound on each chain operation inside a TX/RX transition.
    pub fn transition_timeout(mut self, timeout: Duration) -> Self {
        self.transition_timeout = timeout;
        self
    }

    /// Longest command line a session buffers before discarding it.
    pub fn max_line_len(mut self, len: usize) -> Self {
        self.max_line_len = len;
        self
    }

    /// `host:port` as passed to the socket bind. Bare IPv6 hosts are
    /// bracketed.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn max_line_length(&self) -> usize {
        self.max_line_len
    }

    /// Options for the [`ModeController`](crate::ModeController) derived
    /// from this configuration.
    pub fn controller_options(&self) -> ModeControllerOptions {
        ModeControllerOptions {
            transition_timeout: self.transition_timeout,
        }
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidParameter("bind host is empty".into()));
        }
        if self.transition_timeout.is_zero() {
            return Err(Error::InvalidParameter(
                "transition timeout must be greater than zero".into(),
            ));
        }
        if self.max_line_len == 0 {
            return Err(Error::InvalidParameter(
                "max line length must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_loopback_4575() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:4575");
        assert_eq!(config.max_line_length(), DEFAULT_MAX_LINE_LEN);
        assert_eq!(
            config.controller_options().transition_timeout,
            DEFAULT_TRANSITION_TIMEOUT
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = ServerConfig::default()
            .host("::1")
            .port(0)
            .transition_timeout(Duration::from_millis(250))
            .max_line_len(64);
        assert_eq!(config.bind_address(), "[::1]:0");
        assert_eq!(config.max_line_length(), 64);
        assert_eq!(
            config.controller_options().transition_timeout,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn validate_rejects_unusable_settings() {
        assert!(ServerConfig::default().host(" ").validate().is_err());
        assert!(
            ServerConfig::default()
                .transition_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(ServerConfig::default().max_line_len(0).validate().is_err());
    }
}
