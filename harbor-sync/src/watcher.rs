//! Filesystem watcher for the synchronized tree
//!
//! Wraps OS-level change notification and produces a live, unbounded,
//! order-preserving sequence of [`FsEvent`]s. Directories are watched
//! non-recursively; newly discovered subdirectories are added to the
//! watch set dynamically via [`FolderWatcher::watch`]. Watcher-internal
//! faults flow on a separate error channel and are non-fatal.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::errors::Result;

/// A filesystem change observed under the watched tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Created,
    Written,
    Removed,
}

pub struct FolderWatcher {
    watcher: RecommendedWatcher,
    events: Option<mpsc::UnboundedReceiver<FsEvent>>,
    errors: Option<mpsc::UnboundedReceiver<notify::Error>>,
}

impl FolderWatcher {
    pub fn new() -> Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for fs_event in convert_notify_event(event) {
                        let _ = event_tx.send(fs_event);
                    }
                }
                Err(e) => {
                    let _ = error_tx.send(e);
                }
            },
            notify::Config::default(),
        )?;

        Ok(Self {
            watcher,
            events: Some(event_rx),
            errors: Some(error_rx),
        })
    }

    /// Add a directory to the watch set. Safe to call while events are
    /// being consumed.
    pub fn watch(&mut self, path: &Path) -> Result<()> {
        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    /// Take the event stream. Yields `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<FsEvent>> {
        self.events.take()
    }

    /// Take the watcher-internal error stream.
    pub fn take_errors(&mut self) -> Option<mpsc::UnboundedReceiver<notify::Error>> {
        self.errors.take()
    }
}

fn convert_notify_event(event: Event) -> Vec<FsEvent> {
    let mut out = Vec::new();

    match event.kind {
        EventKind::Create(_) => {
            for path in event.paths {
                out.push(FsEvent {
                    path,
                    kind: FsEventKind::Created,
                });
            }
        }
        EventKind::Remove(_) => {
            for path in event.paths {
                out.push(FsEvent {
                    path,
                    kind: FsEventKind::Removed,
                });
            }
        }
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => {
                for path in event.paths {
                    out.push(FsEvent {
                        path,
                        kind: FsEventKind::Removed,
                    });
                }
            }
            RenameMode::To => {
                for path in event.paths {
                    out.push(FsEvent {
                        path,
                        kind: FsEventKind::Created,
                    });
                }
            }
            // A rename observed with both endpoints: old path disappears,
            // new path appears.
            RenameMode::Both => {
                let mut paths = event.paths.into_iter();
                if let Some(from) = paths.next() {
                    out.push(FsEvent {
                        path: from,
                        kind: FsEventKind::Removed,
                    });
                }
                if let Some(to) = paths.next() {
                    out.push(FsEvent {
                        path: to,
                        kind: FsEventKind::Created,
                    });
                }
            }
            _ => {}
        },
        EventKind::Modify(_) => {
            for path in event.paths {
                out.push(FsEvent {
                    path,
                    kind: FsEventKind::Written,
                });
            }
        }
        _ => {}
    }

    out
}
