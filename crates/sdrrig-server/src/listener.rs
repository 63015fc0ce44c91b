//! TCP accept loop and session supervision.
//!
//! The [`Listener`] spawns one [`Session`] task per accepted connection
//! into a `JoinSet`. A session that fails or panics is logged and reaped
//! without affecting the others. Shutdown is driven by a
//! [`CancellationToken`]: the accept loop stops, sessions finish the
//! request they are executing, the active chain is stopped, and only then
//! is the listening socket released.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use sdrrig_core::error::Result;

use crate::config::ServerConfig;
use crate::controller::ModeController;
use crate::dispatch::Dispatcher;
use crate::session::Session;

/// Pause after a failed `accept()` so a persistent error (e.g. too many
/// open files) does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// A bound rig-control endpoint.
pub struct Listener {
    listener: TcpListener,
    controller: Arc<ModeController>,
    max_line_len: usize,
    cancel: CancellationToken,
}

impl Listener {
    /// Validate `config` and bind its address.
    ///
    /// Fails if the address is in use or otherwise cannot be bound; the
    /// server never runs without a listening socket.
    pub async fn bind(config: &ServerConfig, controller: Arc<ModeController>) -> Result<Self> {
        config.validate()?;
        let address = config.bind_address();
        let listener = TcpListener::bind(address.as_str()).await.inspect_err(|e| {
            error!(address = %address, error = %e, "failed to bind rigctl listener");
        })?;
        info!(address = %listener.local_addr()?, "rigctl listener bound");

        Ok(Listener {
            listener,
            controller,
            max_line_len: config.max_line_length(),
            cancel: CancellationToken::new(),
        })
    }

    /// The address actually bound (useful when the port was 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// A token that stops [`run`](Listener::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Accept connections until the shutdown token is cancelled.
    ///
    /// Returns the result of stopping the active chain.
    pub async fn run(self) -> Result<()> {
        let Listener {
            listener,
            controller,
            max_line_len,
            cancel,
        } = self;
        let mut sessions: JoinSet<(SocketAddr, io::Result<()>)> = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("rigctl listener shutting down");
                    break;
                }

                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    log_session_exit(joined);
                }

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "client connected");
                        if let Err(e) = stream.set_nodelay(true) {
                            debug!(%peer, error = %e, "could not disable nagle");
                        }
                        let session = Session::new(
                            stream,
                            Dispatcher::new(Arc::clone(&controller)),
                            max_line_len,
                            cancel.child_token(),
                        );
                        sessions.spawn(
                            async move { (peer, session.run().await) }
                                .instrument(info_span!("session", %peer)),
                        );
                    }
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        if !sessions.is_empty() {
            info!(sessions = sessions.len(), "waiting for open sessions");
        }
        while let Some(joined) = sessions.join_next().await {
            log_session_exit(joined);
        }

        let stopped = controller.shutdown().await;
        if let Err(e) = &stopped {
            error!(error = %e, "failed to stop active chain");
        }
        drop(listener);
        info!("rigctl listener closed");
        stopped
    }
}

fn log_session_exit(joined: std::result::Result<(SocketAddr, io::Result<()>), JoinError>) {
    match joined {
        Ok((peer, Ok(()))) => info!(%peer, "client disconnected"),
        Ok((peer, Err(e))) => warn!(%peer, error = %e, "session ended with error"),
        Err(e) if e.is_panic() => error!(error = %e, "session panicked"),
        Err(e) => debug!(error = %e, "session task cancelled"),
    }
}
