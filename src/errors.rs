// src/errors.rs

//! Error types shared by both watcher backends.
//!
//! Only misuse of the watcher surface (operating on a closed watcher,
//! removing a path that was never registered, adding a path that does not
//! exist) is reported synchronously. Runtime failures from the backends are
//! delivered on the watcher's error stream instead and are never fatal.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by a [`crate::FileWatcher`].
#[derive(Debug, Error)]
pub enum WatchError {
    /// The watcher has been closed; `add`/`remove` are no longer possible.
    #[error("file watcher is closed")]
    Closed,

    /// `remove` was called for a path that was never registered.
    #[error("path is not watched: {0}")]
    UnknownPath(PathBuf),

    /// `add` was called for a path that does not exist on disk.
    #[error("path does not exist: {path}")]
    PathNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A failure reported by the native notification backend.
    #[error("backend error: {0}")]
    Backend(String),

    /// An I/O failure observed while polling a watched path.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
