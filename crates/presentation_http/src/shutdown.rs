//! Graceful shutdown with a bounded drain period

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{signal, sync::Notify};
use tracing::info;

/// Wait for SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

/// Drive `server` to completion, giving up `grace` after `signalled` fires
///
/// Returns `Ok(true)` when the server drained on its own and `Ok(false)` when
/// connections were still open at the deadline.
pub async fn drain<S, E>(server: S, signalled: Arc<Notify>, grace: Duration) -> Result<bool, E>
where
    S: Future<Output = Result<(), E>>,
{
    let deadline = async {
        signalled.notified().await;
        info!("Waiting up to {:?} for connections to close", grace);
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result.map(|()| true),
        () = deadline => Ok(false),
    }
}
