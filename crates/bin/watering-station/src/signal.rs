//! Termination signals that cut a run short.
//!
//! Every signal whose default action would kill the process while a relay
//! is open is caught here instead, so the run future can be dropped and
//! its relay guards can close their lines.

#[cfg(unix)]
use std::task::Poll;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind};
use tracing::warn;

/// Signals that interrupt a run, by the name they are logged under.
#[cfg(unix)]
pub const INTERRUPTING: [(&str, fn() -> SignalKind); 4] = [
    ("SIGINT", SignalKind::interrupt),
    ("SIGTERM", SignalKind::terminate),
    ("SIGHUP", SignalKind::hangup),
    ("SIGQUIT", SignalKind::quit),
];

/// Handlers for every interrupting signal, installed when created.
pub struct Shutdown {
    #[cfg(unix)]
    streams: Vec<(&'static str, Signal)>,
}

impl Shutdown {
    /// Install the handlers. Must be called from inside the runtime.
    ///
    /// A signal that cannot be listened for is logged and skipped.
    #[cfg(unix)]
    #[must_use]
    pub fn listen() -> Self {
        let streams = INTERRUPTING
            .iter()
            .filter_map(|(name, kind)| match tokio::signal::unix::signal(kind()) {
                Ok(stream) => Some((*name, stream)),
                Err(err) => {
                    warn!(signal = name, error = %err, "cannot listen for signal");
                    None
                }
            })
            .collect();
        Self { streams }
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn listen() -> Self {
        Self {}
    }

    /// Resolves with the name of the first signal received.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> &'static str {
        std::future::poll_fn(|cx| {
            for (name, stream) in &mut self.streams {
                if stream.poll_recv(cx).is_ready() {
                    return Poll::Ready(*name);
                }
            }
            Poll::Pending
        })
        .await
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> &'static str {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        "SIGINT"
    }
}
