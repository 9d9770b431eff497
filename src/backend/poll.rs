// src/backend/poll.rs

//! Poll-backend watcher: periodic stat-and-diff over a snapshot of watched
//! paths.
//!
//! A single tokio task wakes on a fixed interval, re-stats every registered
//! path and compares against the last-observed snapshot. Watched directories
//! are expanded into per-child entries so creates, removals and writes of
//! children are detected individually. All snapshot state lives behind one
//! mutex; `add`/`remove` take the lock briefly and never wait on a tick.

use std::collections::HashMap;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::backend::{BackendKind, FileWatcher};
use crate::errors::WatchError;
use crate::event::{EventKind, FileEvent};

/// Last-observed metadata for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    len: u64,
    mtime: Option<SystemTime>,
    is_dir: bool,
}

impl Snapshot {
    fn of(meta: &Metadata) -> Self {
        Self {
            len: meta.len(),
            mtime: meta.modified().ok(),
            is_dir: meta.is_dir(),
        }
    }
}

/// Snapshot state for one registered path.
///
/// `snapshot` is `None` while the path is known-missing; the path stays
/// registered so a later re-creation is reported as `Create`. For
/// directories, `children` holds one snapshot per current child.
#[derive(Debug, Default)]
struct WatchEntry {
    snapshot: Option<Snapshot>,
    children: HashMap<PathBuf, Snapshot>,
}

type WatchSet = HashMap<PathBuf, WatchEntry>;

/// Watcher that detects changes by periodically re-statting watched paths.
#[derive(Debug)]
pub struct PollWatcher {
    watches: Arc<Mutex<WatchSet>>,
    stop_tx: watch::Sender<bool>,
    /// Handle of the tick loop; `None` once closed.
    ticker: Option<JoinHandle<()>>,
    events_rx: mpsc::UnboundedReceiver<FileEvent>,
    errors_rx: mpsc::UnboundedReceiver<WatchError>,
}

impl PollWatcher {
    /// Construct a polling watcher that diffs every `interval`.
    pub fn new(interval: Duration) -> Self {
        let (event_tx, events_rx) = mpsc::unbounded_channel();
        let (error_tx, errors_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        let watches = Arc::new(Mutex::new(WatchSet::new()));

        let ticker = tokio::spawn(run_poll_loop(
            Arc::clone(&watches),
            interval,
            stop_rx,
            event_tx,
            error_tx,
        ));

        Self {
            watches,
            stop_tx,
            ticker: Some(ticker),
            events_rx,
            errors_rx,
        }
    }
}

#[async_trait]
impl FileWatcher for PollWatcher {
    fn kind(&self) -> BackendKind {
        BackendKind::Poll
    }

    fn channels(
        &mut self,
    ) -> (
        &mut mpsc::UnboundedReceiver<FileEvent>,
        &mut mpsc::UnboundedReceiver<WatchError>,
    ) {
        (&mut self.events_rx, &mut self.errors_rx)
    }

    fn add(&mut self, path: &Path) -> Result<(), WatchError> {
        if self.ticker.is_none() {
            return Err(WatchError::Closed);
        }

        let meta = fs::metadata(path).map_err(|source| WatchError::PathNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        let mut watches = lock(&self.watches);
        if watches.contains_key(path) {
            return Ok(());
        }

        let snapshot = Snapshot::of(&meta);
        // Capture current children as the baseline so the first tick does
        // not report pre-existing files as created.
        let children = if snapshot.is_dir {
            list_children(path).unwrap_or_default()
        } else {
            HashMap::new()
        };

        debug!(path = %path.display(), "registered path with polling watcher");
        watches.insert(
            path.to_path_buf(),
            WatchEntry {
                snapshot: Some(snapshot),
                children,
            },
        );
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<(), WatchError> {
        if self.ticker.is_none() {
            return Err(WatchError::Closed);
        }

        let mut watches = lock(&self.watches);
        if watches.remove(path).is_none() {
            return Err(WatchError::UnknownPath(path.to_path_buf()));
        }
        debug!(path = %path.display(), "deregistered path from polling watcher");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), WatchError> {
        let Some(ticker) = self.ticker.take() else {
            return Ok(());
        };

        let _ = self.stop_tx.send(true);
        if let Err(err) = ticker.await {
            warn!(%err, "poll loop task did not exit cleanly");
        }
        lock(&self.watches).clear();
        debug!("closed polling watcher");
        Ok(())
    }
}

/// A poisoned lock only means a tick panicked mid-diff; the snapshot state
/// itself is still usable.
fn lock(watches: &Mutex<WatchSet>) -> MutexGuard<'_, WatchSet> {
    watches.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The dedicated tick loop. Exits when the stop signal fires or the watcher
/// handle is dropped; the event/error senders drop with it, terminating both
/// streams.
async fn run_poll_loop(
    watches: Arc<Mutex<WatchSet>>,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
    event_tx: mpsc::UnboundedSender<FileEvent>,
    error_tx: mpsc::UnboundedSender<WatchError>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; consume it so every diff happens a
    // full interval after the previous one.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {
                let mut watches = lock(&watches);
                for (path, entry) in watches.iter_mut() {
                    diff_entry(path, entry, &event_tx, &error_tx);
                }
            }
        }
    }

    debug!("poll loop stopped");
}

/// Re-stat one registered path and emit events for whatever changed since
/// the stored snapshot.
fn diff_entry(
    path: &Path,
    entry: &mut WatchEntry,
    event_tx: &mpsc::UnboundedSender<FileEvent>,
    error_tx: &mpsc::UnboundedSender<WatchError>,
) {
    let current = match fs::metadata(path) {
        Ok(meta) => Snapshot::of(&meta),
        Err(source) => {
            // Missing or unstattable both degrade to a removal of this path
            // only; the rest of the tick continues.
            if entry.snapshot.take().is_some() {
                if source.kind() != io::ErrorKind::NotFound {
                    let _ = error_tx.send(WatchError::Io {
                        path: path.to_path_buf(),
                        source,
                    });
                }
                entry.children.clear();
                let _ = event_tx.send(FileEvent::new(path, EventKind::Remove));
            }
            return;
        }
    };

    match entry.snapshot {
        None => {
            let _ = event_tx.send(FileEvent::new(path, EventKind::Create));
            entry.snapshot = Some(current);
        }
        Some(previous) if previous != current => {
            // A directory's own mtime moves exactly when entries appear or
            // vanish; those changes are reported per child below.
            if !current.is_dir {
                let _ = event_tx.send(FileEvent::new(path, EventKind::Write));
            }
            entry.snapshot = Some(current);
        }
        Some(_) => {}
    }

    if current.is_dir {
        diff_children(path, entry, event_tx, error_tx);
    }
}

/// Diff the current directory listing against the previously known children.
fn diff_children(
    path: &Path,
    entry: &mut WatchEntry,
    event_tx: &mpsc::UnboundedSender<FileEvent>,
    error_tx: &mpsc::UnboundedSender<WatchError>,
) {
    let current = match list_children(path) {
        Ok(children) => children,
        Err(source) => {
            // Keep the previous baseline and retry next tick.
            let _ = error_tx.send(WatchError::Io {
                path: path.to_path_buf(),
                source,
            });
            return;
        }
    };

    for (child, snapshot) in &current {
        match entry.children.get(child) {
            None => {
                let _ = event_tx.send(FileEvent::new(child.clone(), EventKind::Create));
            }
            Some(previous) if previous != snapshot && !snapshot.is_dir => {
                let _ = event_tx.send(FileEvent::new(child.clone(), EventKind::Write));
            }
            Some(_) => {}
        }
    }

    for child in entry.children.keys() {
        if !current.contains_key(child) {
            let _ = event_tx.send(FileEvent::new(child.clone(), EventKind::Remove));
        }
    }

    entry.children = current;
}

fn list_children(path: &Path) -> io::Result<HashMap<PathBuf, Snapshot>> {
    let mut children = HashMap::new();
    for dir_entry in fs::read_dir(path)? {
        let dir_entry = dir_entry?;
        // A child can vanish between listing and stat; it will show up as
        // removed on a later tick instead.
        if let Ok(meta) = dir_entry.metadata() {
            children.insert(dir_entry.path(), Snapshot::of(&meta));
        }
    }
    Ok(children)
}
