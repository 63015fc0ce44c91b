//! Line-oriented rigctl client for end-to-end tests.
//!
//! [`RigctlClient`] speaks the client side of the protocol the way logging
//! software does: it writes one LF-terminated command and reads back a
//! known number of CRLF-terminated reply lines.
//!
//! # Example
//!
//! ```no_run
//! use sdrrig_test_harness::RigctlClient;
//!
//! # async fn example() -> sdrrig_core::Result<()> {
//! let mut client = RigctlClient::connect("127.0.0.1:4575").await?;
//! let reply = client.command("t", 1).await?;
//! assert_eq!(reply, "0\r\n");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use sdrrig_core::error::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

/// How long a single reply line may take before the test gives up.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A test client connected to a rig-control server.
#[derive(Debug)]
pub struct RigctlClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    read_timeout: Duration,
}

impl RigctlClient {
    /// Connect to a server at `addr`.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();
        Ok(RigctlClient {
            reader: BufReader::new(read_half),
            writer: write_half,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    /// Override the per-line read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Write `line` followed by LF.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        self.send_raw(format!("{line}\n").as_bytes()).await
    }

    /// Write raw bytes with no terminator added.
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read one reply line, including its CRLF terminator.
    ///
    /// Returns [`Error::ConnectionLost`] if the server closes the
    /// connection first.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = tokio::time::timeout(self.read_timeout, self.reader.read_line(&mut line))
            .await
            .map_err(|_| Error::Timeout)??;
        if n == 0 {
            return Err(Error::ConnectionLost);
        }
        Ok(line)
    }

    /// Send `line` and collect `reply_lines` lines of response, verbatim.
    pub async fn command(&mut self, line: &str, reply_lines: usize) -> Result<String> {
        self.send_line(line).await?;
        let mut reply = String::new();
        for _ in 0..reply_lines {
            reply.push_str(&self.read_line().await?);
        }
        Ok(reply)
    }

    /// Whether the server has closed the connection.
    ///
    /// Waits up to the read timeout for end-of-stream; returns `false` if
    /// more data arrives or the connection stays open.
    pub async fn is_closed_by_peer(&mut self) -> bool {
        let mut buf = [0u8; 64];
        matches!(
            tokio::time::timeout(self.read_timeout, self.reader.read(&mut buf)).await,
            Ok(Ok(0)) | Ok(Err(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn test_listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    #[tokio::test]
    async fn command_collects_requested_lines() {
        let (listener, addr) = test_listener().await;

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut stream = BufReader::new(stream);
            let mut line = String::new();
            stream.read_line(&mut line).await.unwrap();
            assert_eq!(line, "s\n");
            stream.get_mut().write_all(b"0\r\nVFOA\r\n").await.unwrap();
        });

        let mut client = RigctlClient::connect(&addr).await.unwrap();
        assert_eq!(client.command("s", 2).await.unwrap(), "0\r\nVFOA\r\n");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn read_line_reports_close() {
        let (listener, addr) = test_listener().await;

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let mut client = RigctlClient::connect(&addr).await.unwrap();
        server.await.unwrap();
        assert!(matches!(client.read_line().await, Err(Error::ConnectionLost)));
    }

    #[tokio::test]
    async fn read_line_times_out() {
        let (listener, addr) = test_listener().await;

        let server = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut client = RigctlClient::connect(&addr)
            .await
            .unwrap()
            .read_timeout(Duration::from_millis(50));
        assert!(matches!(client.read_line().await, Err(Error::Timeout)));
        server.abort();
    }
}
