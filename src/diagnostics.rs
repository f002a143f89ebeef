//! Diagnostic events emitted during an organizing pass.
//!
//! The organizer never prints. It reports what it does as [`OrganizeEvent`]s to
//! a [`DiagnosticSink`] handed in with the request; the CLI plugs in a console
//! sink, tests plug in a [`MemorySink`].

use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;

/// Severity of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Debug => write!(f, "DEBUG"),
            Level::Info => write!(f, "INFO"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

impl From<Level> for log::Level {
    fn from(level: Level) -> Self {
        match level {
            Level::Debug => log::Level::Debug,
            Level::Info => log::Level::Info,
            Level::Error => log::Level::Error,
        }
    }
}

/// Whether an entry is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Folder => write!(f, "folder"),
        }
    }
}

/// Something that happened during a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum OrganizeEvent {
    /// The source was listed; `entries` direct children will be processed.
    ScanStarted { source: PathBuf, entries: usize },
    /// A destination folder did not exist and was created.
    FolderCreated { path: PathBuf },
    /// A file was moved into its category folder.
    FileMoved {
        old_name: String,
        new_name: String,
        destination: PathBuf,
    },
    /// A subfolder was moved to the unorganized root.
    FolderMoved {
        old_name: String,
        new_name: String,
        destination: PathBuf,
    },
    /// Dry run: the entry would have been moved.
    Planned {
        kind: EntryKind,
        old_name: String,
        new_name: String,
        destination: PathBuf,
    },
    /// The entry was left in place on purpose.
    EntrySkipped { name: String, reason: String },
    /// Processing the entry failed; the pass continues.
    EntryFailed { name: String, reason: String },
    /// End of the pass.
    Summary {
        files_moved: usize,
        folders_moved: usize,
        dry_run: bool,
    },
}

impl OrganizeEvent {
    pub fn level(&self) -> Level {
        match self {
            OrganizeEvent::EntryFailed { .. } => Level::Error,
            OrganizeEvent::EntrySkipped { .. } | OrganizeEvent::ScanStarted { .. } => Level::Debug,
            _ => Level::Info,
        }
    }

    /// True for the event that closes the handling of a single entry.
    pub fn is_entry_outcome(&self) -> bool {
        matches!(
            self,
            OrganizeEvent::FileMoved { .. }
                | OrganizeEvent::FolderMoved { .. }
                | OrganizeEvent::Planned { .. }
                | OrganizeEvent::EntrySkipped { .. }
                | OrganizeEvent::EntryFailed { .. }
        )
    }
}

impl fmt::Display for OrganizeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrganizeEvent::ScanStarted { source, entries } => {
                write!(f, "Scanning {} ({} entries)", source.display(), entries)
            }
            OrganizeEvent::FolderCreated { path } => {
                write!(f, "Created destination folder: {}", path.display())
            }
            OrganizeEvent::FileMoved {
                old_name,
                new_name,
                destination,
            } => write!(
                f,
                "Moving file: {} -> {} as {}",
                old_name,
                destination.display(),
                new_name
            ),
            OrganizeEvent::FolderMoved {
                old_name,
                new_name,
                destination,
            } => {
                if old_name == new_name {
                    write!(f, "Moving folder: {} -> {}", old_name, destination.display())
                } else {
                    write!(
                        f,
                        "Moving folder: {} -> {} as {}",
                        old_name,
                        destination.display(),
                        new_name
                    )
                }
            }
            OrganizeEvent::Planned {
                kind,
                old_name,
                new_name,
                destination,
            } => write!(
                f,
                "Would move {}: {} -> {} as {}",
                kind,
                old_name,
                destination.display(),
                new_name
            ),
            OrganizeEvent::EntrySkipped { name, reason } => {
                write!(f, "Skipping {}: {}", name, reason)
            }
            OrganizeEvent::EntryFailed { name, reason } => {
                write!(f, "Error processing {}: {}", name, reason)
            }
            OrganizeEvent::Summary {
                files_moved,
                folders_moved,
                dry_run,
            } => {
                let verb = if *dry_run { "to move" } else { "moved" };
                write!(
                    f,
                    "Files {}: {}\nFolders {} to unorganized: {}",
                    verb, files_moved, verb, folders_moved
                )
            }
        }
    }
}

/// Receives events from the organizer.
pub trait DiagnosticSink {
    fn record(&self, event: &OrganizeEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: &OrganizeEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<OrganizeEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the events recorded so far.
    pub fn events(&self) -> Vec<OrganizeEvent> {
        self.events.borrow().clone()
    }

    /// Events at or above `level`.
    pub fn at_level(&self, level: Level) -> Vec<OrganizeEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.level() >= level)
            .cloned()
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, event: &OrganizeEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
