// src/system/signals.rs

use crate::CancellationToken;
use colored::Colorize;
use std::sync::atomic::Ordering;

/// Spawns the interrupt listener on the current runtime.
///
/// On SIGINT or SIGTERM (Ctrl+C on Windows) it prints a notice and trips the token.
/// Children are not killed; they receive the terminal's signal themselves and the
/// engine waits for them.
pub fn spawn_interrupt_listener(cancellation_token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    log::warn!("Could not listen for SIGTERM: {}", e);
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => log::debug!("Received SIGINT."),
                _ = sigterm.recv() => log::debug!("Received SIGTERM."),
            }
        }
        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::warn!("Could not listen for Ctrl+C: {}", e);
                return;
            }
        }

        eprintln!("{}", "got interrupt...".yellow());
        cancellation_token.store(true, Ordering::SeqCst);
    });
}
