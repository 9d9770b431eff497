// src/backend/mod.rs

//! Watcher backends and the selecting factory.
//!
//! Two implementations of the same capability contract:
//! - [`NativeEventWatcher`]: thin adapter over the OS-native notification
//!   mechanism (`notify`).
//! - [`PollWatcher`]: periodic stat-and-diff engine, for environments where
//!   native events do not work.
//!
//! [`new`] picks between them automatically; the explicit constructors are
//! available for callers that want to bypass auto-detection.

pub mod native;
pub mod poll;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::classify::{self, Verdict};
use crate::errors::WatchError;
use crate::event::FileEvent;

pub use native::NativeEventWatcher;
pub use poll::PollWatcher;

/// Which backend a watcher instance is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// OS-native change notifications.
    Events,
    /// Timer-driven stat-and-diff polling.
    Poll,
}

/// The capability contract implemented by both watcher backends.
///
/// Lifecycle: a watcher is open from construction until the first `close`;
/// after that, `add`/`remove` fail with [`WatchError::Closed`] and both
/// streams terminate. `close` is idempotent.
#[async_trait]
pub trait FileWatcher: Send {
    /// Which backend this watcher runs on.
    fn kind(&self) -> BackendKind;

    /// Both receivers at once, so callers can `select!` across events and
    /// errors while holding a single borrow of the watcher.
    ///
    /// Receiving blocks until an event/error is available; both streams
    /// yield `None` once the watcher is closed.
    fn channels(
        &mut self,
    ) -> (
        &mut mpsc::UnboundedReceiver<FileEvent>,
        &mut mpsc::UnboundedReceiver<WatchError>,
    );

    /// The stream of observed changes.
    fn events(&mut self) -> &mut mpsc::UnboundedReceiver<FileEvent> {
        self.channels().0
    }

    /// The stream of non-fatal backend failures.
    fn errors(&mut self) -> &mut mpsc::UnboundedReceiver<WatchError> {
        self.channels().1
    }

    /// Register a path for watching.
    ///
    /// Fails if the watcher is closed or the path does not exist. Adding an
    /// already-registered path is a no-op.
    fn add(&mut self, path: &Path) -> Result<(), WatchError>;

    /// Deregister a path.
    ///
    /// Fails with [`WatchError::UnknownPath`] if the path was never
    /// registered.
    fn remove(&mut self, path: &Path) -> Result<(), WatchError>;

    /// Release all resources and terminate both streams.
    ///
    /// Waits for any background work to stop. Calling `close` on an
    /// already-closed watcher is a benign no-op.
    async fn close(&mut self) -> Result<(), WatchError>;
}

/// Construct a watcher, preferring native events and falling back to polling.
///
/// The fallback absorbs every backend construction failure, so this never
/// fails: a classifier veto (virtualized kernels where native events do not
/// propagate) or any error from the native mechanism yields a poll-backend
/// watcher with the given interval instead.
pub fn new(poll_interval: Duration) -> Box<dyn FileWatcher> {
    new_with_probe(poll_interval, classify::kernel_release)
}

/// Like [`new`], but with an injected kernel-release probe.
///
/// The decision is made once here and never re-evaluated for the lifetime of
/// the returned watcher.
pub fn new_with_probe(
    poll_interval: Duration,
    probe: impl FnOnce() -> Option<String>,
) -> Box<dyn FileWatcher> {
    let release = probe();
    if classify::classify_release(release.as_deref()) == Verdict::NativeReliable {
        match NativeEventWatcher::new() {
            Ok(watcher) => {
                debug!("using event based file watcher");
                return Box::new(watcher);
            }
            Err(err) => {
                debug!(%err, "native watcher construction failed, falling back to polling");
            }
        }
    }
    debug!("using polling based file watcher");
    Box::new(PollWatcher::new(poll_interval))
}
