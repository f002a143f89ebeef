//! dirsort - sort a folder into category subfolders
//!
//! This library classifies the files of a source folder by extension, renames
//! them with a `YYYY-MM-DD-` date prefix and moves them into category folders
//! under an organized root. Subfolders are moved as a whole to an unorganized
//! root. Categories and options come from a TOML configuration file.

pub mod cli;
pub mod config;
pub mod date_resolver;
pub mod diagnostics;
pub mod file_category;
pub mod file_organizer;
pub mod filename;
pub mod organizer;
pub mod output;

pub use config::{ConfigError, OrganizerConfig};
pub use diagnostics::{DiagnosticSink, MemorySink, OrganizeEvent};
pub use file_category::{Category, FileMapper};
pub use file_organizer::{FileOrganizer, OrganizeError, OrganizeResult};
pub use organizer::{DirectoryOrganizer, OrganizeOptions, OrganizeReport, OrganizeRequest};

pub use cli::{OrganizeCommand, run_cli};
