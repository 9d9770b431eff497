// src/reload.rs

//! Hot-reloading listener: consumes a watcher's streams and signals "code
//! changed" to its caller.
//!
//! The listener owns the watcher for its whole lifetime: it registers every
//! root (expanding directories recursively), then loops over events and
//! errors until either the cancellation signal fires or the watcher's
//! streams terminate. On cancellation it closes the watcher before
//! returning, so no background polling survives past it.

use std::path::PathBuf;

use tokio::sync::watch;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::backend::FileWatcher;
use crate::errors::WatchError;
use crate::event::FileEvent;

/// What the select loop observed on one iteration.
enum Next {
    Cancelled,
    Event(FileEvent),
    Error(WatchError),
    Terminated,
}

/// Run the hot-reloading listener until cancellation or stream termination.
///
/// `on_change` is invoked once per observed change event; what "code
/// changed" means is up to the caller. `cancel` fires when its value changes
/// or its sender is dropped.
pub async fn run_hot_reloading_listener(
    mut watcher: Box<dyn FileWatcher>,
    paths: Vec<PathBuf>,
    mut cancel: watch::Receiver<bool>,
    mut on_change: impl FnMut(&FileEvent),
) {
    register_roots(watcher.as_mut(), &paths);

    loop {
        let next = {
            let (events, errors) = watcher.channels();
            tokio::select! {
                _ = cancel.changed() => Next::Cancelled,
                event = events.recv() => match event {
                    Some(event) => Next::Event(event),
                    None => Next::Terminated,
                },
                error = errors.recv() => match error {
                    Some(error) => Next::Error(error),
                    None => Next::Terminated,
                },
            }
        };

        match next {
            Next::Cancelled => {
                debug!("hot reloading listener cancelled, closing watcher");
                if let Err(err) = watcher.close().await {
                    warn!(%err, "closing file watcher failed");
                }
                return;
            }
            Next::Event(event) => {
                debug!(path = %event.path.display(), kind = %event.kind, "hot reloading event");
                on_change(&event);
            }
            Next::Error(error) => {
                warn!(%error, "file watcher reported an error");
            }
            Next::Terminated => {
                debug!("watcher streams terminated, hot reloading listener exiting");
                return;
            }
        }
    }
}

/// Register every root with the watcher, expanding directories recursively.
///
/// A root that cannot be registered is logged and skipped; the listener
/// keeps running for the remaining roots.
fn register_roots(watcher: &mut dyn FileWatcher, paths: &[PathBuf]) {
    for root in paths {
        if root.is_dir() {
            for entry in WalkDir::new(root).follow_links(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(%err, "skipping unreadable entry under {}", root.display());
                        continue;
                    }
                };
                if !entry.file_type().is_dir() {
                    continue;
                }
                if let Err(err) = watcher.add(entry.path()) {
                    warn!(%err, "failed to watch directory {}", entry.path().display());
                }
            }
        } else if let Err(err) = watcher.add(root) {
            warn!(%err, "failed to watch path {}", root.display());
        }
    }
}
