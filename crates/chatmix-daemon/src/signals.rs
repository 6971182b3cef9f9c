//! Signal handling for graceful shutdown.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

/// Set up signal handlers for graceful shutdown.
///
/// Returns a receiver that will receive a message when a shutdown
/// signal (SIGTERM, SIGINT) is received.
pub fn setup_signal_handlers() -> Result<mpsc::Receiver<&'static str>> {
    let (tx, rx) = mpsc::channel(1);

    let mut sigterm =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let tx_term = tx.clone();
    tokio::spawn(async move {
        sigterm.recv().await;
        info!("Received SIGTERM");
        let _ = tx_term.send("SIGTERM").await;
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received SIGINT");
            let _ = tx.send("SIGINT").await;
        }
    });

    Ok(rx)
}
