//! Graceful shutdown.
//!
//! A [`ShutdownSignal`] is a cloneable trigger; every clone observes the
//! same state. The server stops accepting once it fires and asks open
//! connections to finish their current request.

use tokio_util::sync::CancellationToken;

/// Coordinates shutdown across the accept loop and connection tasks.
///
/// # Example
///
/// ```rust
/// use turnstile_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let observer = shutdown.clone();
///
/// shutdown.trigger();
/// assert!(observer.is_shutdown());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that fires on SIGTERM or Ctrl+C.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });
        signal
    }

    /// Fires the signal. Idempotent.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Returns true once the signal has fired.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the signal fires, immediately if it already has.
    pub async fn recv(&self) {
        self.token.cancelled().await;
    }
}

async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        tracing::info!("received SIGTERM, shutting down");
                    }
                    result = tokio::signal::ctrl_c() => on_ctrl_c(result).await,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM, Ctrl+C only");
                on_ctrl_c(tokio::signal::ctrl_c().await).await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        on_ctrl_c(tokio::signal::ctrl_c().await).await;
    }
}

async fn on_ctrl_c(result: std::io::Result<()>) {
    match result {
        Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
        Err(e) => {
            // Without a signal source only an explicit trigger can stop the server.
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
