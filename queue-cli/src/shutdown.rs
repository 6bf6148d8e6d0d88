//! Termination signal handling
//!
//! [`cancel_on_signal`] ties a [`CancellationToken`] to the process
//! receiving SIGINT, SIGTERM or SIGQUIT (Ctrl-C on other platforms), so a
//! waiting job stops polling as soon as the CI platform cancels it.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Cancels `token` when a termination signal arrives
pub fn cancel_on_signal(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            result = wait_for_shutdown_signal() => match result {
                Ok(()) => {
                    warn!("Termination signal received, abandoning the wait");
                    token.cancel();
                }
                Err(e) => warn!("Failed to install signal handlers: {}", e),
            },
        }
    })
}

/// Waits for a termination signal.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
