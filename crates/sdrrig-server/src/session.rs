//! Per-connection request loop.
//!
//! A [`Session`] reads newline-terminated requests, hands each one to its
//! [`Dispatcher`], and writes the reply before reading the next request.
//! Requests pipelined in one segment are answered in order. A trailing
//! request without a newline is still answered when the client half-closes.

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sdrrig_rigctl::Reply;

use crate::dispatch::{Dispatcher, SessionControl};

const READ_CHUNK: usize = 512;

/// One line split off the read buffer.
enum Line {
    Request(String),
    /// Blank, or the discarded tail of an oversized request.
    Skip,
    TooLong,
}

/// One client connection.
pub struct Session<S> {
    stream: S,
    dispatcher: Dispatcher,
    max_line_len: usize,
    cancel: CancellationToken,
    buf: BytesMut,
    /// Dropping the tail of an oversized request up to its newline.
    discarding: bool,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(
        stream: S,
        dispatcher: Dispatcher,
        max_line_len: usize,
        cancel: CancellationToken,
    ) -> Self {
        Session {
            stream,
            dispatcher,
            max_line_len,
            cancel,
            buf: BytesMut::with_capacity(READ_CHUNK),
            discarding: false,
        }
    }

    /// Serve the connection until the client quits, disconnects, or the
    /// session is cancelled.
    ///
    /// Cancellation is only observed between requests; a request that is
    /// already executing runs to completion and its reply is written.
    pub async fn run(mut self) -> io::Result<()> {
        loop {
            while let Some(line) = self.next_line() {
                match line {
                    Line::Request(request) => {
                        if self.respond(&request).await? == SessionControl::Close {
                            return self.close().await;
                        }
                    }
                    Line::TooLong => self.write_reply(&Reply::error()).await?,
                    Line::Skip => {}
                }
            }

            if content_len(&self.buf) > self.max_line_len {
                self.reject_overflow().await?;
            }

            self.buf.reserve(READ_CHUNK);
            let read = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!("session cancelled");
                    return Ok(());
                }

                read = self.stream.read_buf(&mut self.buf) => read?,
            };

            if read == 0 {
                return self.finish().await;
            }
        }
    }

    /// Split the next complete line off the buffer.
    fn next_line(&mut self) -> Option<Line> {
        let pos = self.buf.iter().position(|b| *b == b'\n')?;
        let raw = self.buf.split_to(pos + 1);

        if self.discarding {
            self.discarding = false;
            return Some(Line::Skip);
        }
        let len = content_len(&raw[..pos]);
        if len > self.max_line_len {
            warn!(len, limit = self.max_line_len, "request line too long");
            return Some(Line::TooLong);
        }
        let request = String::from_utf8_lossy(&raw).trim().to_string();
        if request.is_empty() {
            Some(Line::Skip)
        } else {
            Some(Line::Request(request))
        }
    }

    /// Drop a partial request that has outgrown the limit.
    ///
    /// The client gets one `RPRT -1` per oversized request, no matter how
    /// many reads it spans.
    async fn reject_overflow(&mut self) -> io::Result<()> {
        let discarded = self.buf.len();
        self.buf.clear();
        if self.discarding {
            return Ok(());
        }
        warn!(len = discarded, limit = self.max_line_len, "request line too long, discarding");
        self.discarding = true;
        self.write_reply(&Reply::error()).await
    }

    async fn respond(&mut self, line: &str) -> io::Result<SessionControl> {
        let outcome = self.dispatcher.handle_line(line).await;
        debug!(request = line, rejected = outcome.reply.is_error(), "answered");
        self.write_reply(&outcome.reply).await?;
        Ok(outcome.control)
    }

    async fn write_reply(&mut self, reply: &Reply) -> io::Result<()> {
        self.stream.write_all(&reply.encode()).await?;
        self.stream.flush().await
    }

    /// The client closed its write half. Answer a final unterminated request.
    async fn finish(mut self) -> io::Result<()> {
        if !self.discarding && !self.buf.is_empty() {
            let rest = self.buf.split();
            let line = String::from_utf8_lossy(&rest).trim().to_string();
            if !line.is_empty() {
                self.respond(&line).await?;
            }
        }
        debug!("client disconnected");
        Ok(())
    }

    async fn close(mut self) -> io::Result<()> {
        debug!("client quit");
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "shutdown after quit failed");
        }
        Ok(())
    }
}

/// Length of a request without its line terminator.
///
/// A trailing CR is not part of the request, so LF and CRLF clients get
/// the same limit.
fn content_len(line: &[u8]) -> usize {
    match line.last() {
        Some(b'\r') => line.len() - 1,
        _ => line.len(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use sdrrig_test_harness::MockSignalChain;
    use tokio::io::{DuplexStream, duplex};
    use tokio::task::JoinHandle;

    use super::*;
    use crate::controller::{ModeController, ModeControllerOptions};

    async fn dispatcher() -> Dispatcher {
        let tx = MockSignalChain::new("tx", 7_074_000.0);
        let rx = MockSignalChain::new("rx", 14_074_000.0);
        let options = ModeControllerOptions {
            transition_timeout: Duration::from_millis(200),
        };
        let controller = ModeController::start(Box::new(tx), Box::new(rx), options)
            .await
            .unwrap();
        Dispatcher::new(Arc::new(controller))
    }

    async fn spawn_session(
        max_line_len: usize,
        cancel: CancellationToken,
    ) -> (DuplexStream, JoinHandle<io::Result<()>>) {
        let (client, server) = duplex(4096);
        let session = Session::new(server, dispatcher().await, max_line_len, cancel);
        (client, tokio::spawn(session.run()))
    }

    /// Send `input`, half-close, and collect everything the session wrote.
    async fn exchange(input: &[u8], max_line_len: usize) -> String {
        let (mut client, task) = spawn_session(max_line_len, CancellationToken::new()).await;
        client.write_all(input).await.unwrap();
        client.shutdown().await.unwrap();

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        task.await.unwrap().unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn pipelined_requests_answered_in_order() {
        let out = exchange(b"f\nt\n\\chk_vfo\nv\n", 1024).await;
        assert_eq!(out, "14074000\r\n0\r\nCHKVFO 0\r\nRPRT -11\r\n");
    }

    #[tokio::test]
    async fn crlf_requests_are_accepted() {
        let out = exchange(b"t 1\r\nt\r\n", 1024).await;
        assert_eq!(out, "RPRT 0\r\n1\r\n");
    }

    #[tokio::test]
    async fn blank_lines_are_ignored() {
        let out = exchange(b"\n\r\n   \nt\n", 1024).await;
        assert_eq!(out, "0\r\n");
    }

    #[tokio::test]
    async fn unterminated_request_answered_at_eof() {
        let out = exchange(b"t 1\nt", 1024).await;
        assert_eq!(out, "RPRT 0\r\n1\r\n");
    }

    #[tokio::test]
    async fn invalid_utf8_is_an_unknown_command() {
        let out = exchange(b"\xff\xfe\nt\n", 1024).await;
        assert_eq!(out, "RPRT -1\r\n0\r\n");
    }

    #[tokio::test]
    async fn oversized_request_rejected_once() {
        let mut input = vec![b'x'; 64];
        input.extend_from_slice(b"\nt\n");
        let out = exchange(&input, 16).await;
        assert_eq!(out, "RPRT -1\r\n0\r\n");
    }

    #[tokio::test]
    async fn oversized_request_split_across_writes() {
        let (mut client, task) = spawn_session(16, CancellationToken::new()).await;
        client.write_all(&[b'x'; 40]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        client.write_all(&[b'y'; 40]).await.unwrap();
        client.write_all(b"\nt\n").await.unwrap();
        client.shutdown().await.unwrap();

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "RPRT -1\r\n0\r\n");
    }

    #[tokio::test]
    async fn limit_excludes_the_line_terminator() {
        // Exactly 16 bytes of request.
        let request = "f vfoa 7074000.5";
        assert_eq!(request.len(), 16);

        let lf = exchange(format!("{request}\nt\n").as_bytes(), 16).await;
        let crlf = exchange(format!("{request}\r\nt\r\n").as_bytes(), 16).await;
        assert_eq!(lf, "RPRT 0\r\n0\r\n");
        assert_eq!(crlf, lf);

        let over = exchange(b"f vfoa 7074000.55\r\nt\r\n", 16).await;
        assert_eq!(over, "RPRT -1\r\n0\r\n");
    }

    #[tokio::test]
    async fn crlf_split_across_writes_at_the_limit() {
        let (mut client, task) = spawn_session(16, CancellationToken::new()).await;
        client.write_all(b"f vfoa 7074000.5\r").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        client.write_all(b"\nf\n").await.unwrap();
        client.shutdown().await.unwrap();

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "RPRT 0\r\n7074000\r\n");
    }

    #[test]
    fn content_len_ignores_trailing_cr() {
        assert_eq!(content_len(b"t 1\r"), 3);
        assert_eq!(content_len(b"t 1"), 3);
        assert_eq!(content_len(b""), 0);
    }

    #[tokio::test]
    async fn quit_acknowledges_and_closes() {
        let (mut client, task) = spawn_session(1024, CancellationToken::new()).await;
        client.write_all(b"t 1\nq\nt\n").await.unwrap();

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        task.await.unwrap().unwrap();
        // Nothing after `q` is answered.
        assert_eq!(String::from_utf8(out).unwrap(), "RPRT 0\r\nRPRT 0\r\n");
    }

    #[tokio::test]
    async fn cancellation_ends_idle_session() {
        let cancel = CancellationToken::new();
        let (_client, task) = spawn_session(1024, cancel.clone()).await;

        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("session did not stop")
            .unwrap()
            .unwrap();
    }
}
