// src/lib.rs

//! `filenotify` provides a mechanism for watching file(s) for changes.
//!
//! It generally leans on the OS-native notification mechanism (via the
//! `notify` crate), but also provides a poll-based watcher for environments
//! where native events do not propagate reliably (Docker Desktop's
//! `linuxkit` kernels, WSL). Both are wrapped in a common [`FileWatcher`]
//! contract so either can be used interchangeably; [`backend::new`] picks
//! one automatically based on a kernel-release probe and falls back to
//! polling on any native construction failure.

pub mod backend;
pub mod classify;
pub mod cli;
pub mod errors;
pub mod event;
pub mod logging;
pub mod reload;

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info};

pub use backend::{new, new_with_probe, BackendKind, FileWatcher, NativeEventWatcher, PollWatcher};
pub use errors::WatchError;
pub use event::{EventKind, FileEvent};
pub use reload::run_hot_reloading_listener;

use crate::cli::{BackendArg, CliArgs};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - watcher construction (auto-detected or forced via `--backend`)
/// - the hot-reloading listener over the CLI paths
/// - Ctrl-C handling as the cancellation signal
pub async fn run(args: CliArgs) -> Result<()> {
    let interval = Duration::from_millis(args.interval_ms);

    let watcher: Box<dyn FileWatcher> = match args.backend {
        BackendArg::Auto => backend::new(interval),
        BackendArg::Events => Box::new(
            NativeEventWatcher::new().context("constructing native event watcher")?,
        ),
        BackendArg::Poll => Box::new(PollWatcher::new(interval)),
    };

    info!(backend = ?watcher.kind(), paths = ?args.paths, "file watcher ready");

    // Ctrl-C → cancellation signal for the listener.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        debug!("ctrl-c received, cancelling file watcher");
        let _ = cancel_tx.send(true);
    });

    run_hot_reloading_listener(watcher, args.paths, cancel_rx, |event| {
        info!(path = %event.path.display(), kind = %event.kind, "change detected");
    })
    .await;

    Ok(())
}
