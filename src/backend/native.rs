// src/backend/native.rs

//! Event-backend watcher: a pass-through adapter over `notify`.
//!
//! Registering a path creates a native watch; native notifications and
//! errors are forwarded verbatim onto the event/error channels. No
//! buffering or deduplication is added here, so ordering and coalescing
//! guarantees are inherited from the underlying OS mechanism as-is.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

use crate::backend::{BackendKind, FileWatcher};
use crate::errors::WatchError;
use crate::event::FileEvent;

/// Watcher backed by the OS-native change-notification mechanism.
///
/// The inner `RecommendedWatcher` owns the channel senders through its event
/// callback, so dropping it on `close` is what terminates both streams.
pub struct NativeEventWatcher {
    /// `None` once closed.
    inner: Option<RecommendedWatcher>,
    watched: HashSet<PathBuf>,
    events_rx: mpsc::UnboundedReceiver<FileEvent>,
    errors_rx: mpsc::UnboundedReceiver<WatchError>,
}

impl NativeEventWatcher {
    /// Construct the native watcher, failing if the OS mechanism is
    /// unavailable (e.g. inotify instance limits).
    pub fn new() -> Result<Self, notify::Error> {
        let (event_tx, events_rx) = mpsc::unbounded_channel::<FileEvent>();
        let (error_tx, errors_rx) = mpsc::unbounded_channel::<WatchError>();

        // Called synchronously by notify whenever a native event arrives.
        // Send failures just mean the receiver is gone, which only happens
        // during teardown.
        let inner = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    for file_event in FileEvent::from_native(&event) {
                        let _ = event_tx.send(file_event);
                    }
                }
                Err(err) => {
                    let _ = error_tx.send(WatchError::Backend(err.to_string()));
                }
            },
            Config::default(),
        )?;

        Ok(Self {
            inner: Some(inner),
            watched: HashSet::new(),
            events_rx,
            errors_rx,
        })
    }
}

impl std::fmt::Debug for NativeEventWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeEventWatcher")
            .field("closed", &self.inner.is_none())
            .field("watched", &self.watched)
            .finish()
    }
}

#[async_trait]
impl FileWatcher for NativeEventWatcher {
    fn kind(&self) -> BackendKind {
        BackendKind::Events
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
        let Some(inner) = self.inner.as_mut() else {
            return Err(WatchError::Closed);
        };

        if self.watched.contains(path) {
            return Ok(());
        }

        if let Err(source) = std::fs::symlink_metadata(path) {
            return Err(WatchError::PathNotFound {
                path: path.to_path_buf(),
                source,
            });
        }

        inner
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|err| WatchError::Backend(err.to_string()))?;

        self.watched.insert(path.to_path_buf());
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<(), WatchError> {
        let Some(inner) = self.inner.as_mut() else {
            return Err(WatchError::Closed);
        };

        if !self.watched.remove(path) {
            return Err(WatchError::UnknownPath(path.to_path_buf()));
        }

        match inner.unwatch(path) {
            Ok(()) => Ok(()),
            // The native watch can already be gone (e.g. the path was
            // deleted); the contract only cares about registration state.
            Err(notify::Error {
                kind: notify::ErrorKind::WatchNotFound,
                ..
            }) => Ok(()),
            Err(err) => Err(WatchError::Backend(err.to_string())),
        }
    }

    async fn close(&mut self) -> Result<(), WatchError> {
        if self.inner.take().is_some() {
            debug!("closed native event watcher");
            self.watched.clear();
        }
        Ok(())
    }
}
