// src/event.rs

//! The backend-agnostic change event.
//!
//! Both backends report changes in the same shape so downstream consumers
//! never need to know which backend produced an event. The native backend
//! maps `notify`'s fine-grained event kinds down to this coarser set; the
//! poll backend produces `Create`/`Write`/`Remove` directly from its
//! stat-and-diff cycle.

use std::fmt;
use std::path::PathBuf;

use notify::event::{EventKind as NativeKind, ModifyKind};

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The path came into existence.
    Create,
    /// The path's contents (size or modification time) changed.
    Write,
    /// The path disappeared or became unstattable.
    Remove,
    /// The path was renamed. Only the native backend can attribute renames;
    /// the poll backend reports them as `Remove` + `Create` instead.
    Rename,
    /// Permissions or other metadata changed. Native backend only.
    Chmod,
}

impl EventKind {
    /// Map a native event kind onto the shared set.
    ///
    /// Returns `None` for kinds that carry no change information we forward
    /// (access notifications and backend-specific "other" events).
    /// `notify::EventKind::Any` is the imprecise catch-all; we treat it as a
    /// write so that no change is silently dropped.
    pub(crate) fn from_native(kind: &NativeKind) -> Option<Self> {
        match kind {
            NativeKind::Create(_) => Some(EventKind::Create),
            NativeKind::Remove(_) => Some(EventKind::Remove),
            NativeKind::Modify(ModifyKind::Name(_)) => Some(EventKind::Rename),
            NativeKind::Modify(ModifyKind::Metadata(_)) => Some(EventKind::Chmod),
            NativeKind::Modify(_) => Some(EventKind::Write),
            NativeKind::Any => Some(EventKind::Write),
            NativeKind::Access(_) | NativeKind::Other => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Create => "create",
            EventKind::Write => "write",
            EventKind::Remove => "remove",
            EventKind::Rename => "rename",
            EventKind::Chmod => "chmod",
        };
        f.write_str(s)
    }
}

/// A single observed change on a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: EventKind,
}

impl FileEvent {
    pub fn new(path: impl Into<PathBuf>, kind: EventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Expand a native event into one `FileEvent` per affected path.
    ///
    /// Native events may carry several paths (e.g. rename from/to); each is
    /// forwarded individually so consumers see a flat per-path stream.
    pub(crate) fn from_native(event: &notify::Event) -> Vec<FileEvent> {
        let Some(kind) = EventKind::from_native(&event.kind) else {
            return Vec::new();
        };
        event
            .paths
            .iter()
            .map(|path| FileEvent::new(path.clone(), kind))
            .collect()
    }
}
