//! The directory organizing pass.
//!
//! One call to [`DirectoryOrganizer::run`] lists the direct children of the
//! source folder and handles each of them once:
//!
//! - files whose extension maps to a category are date-prefixed and moved to
//!   `<organized>/<category>/<YYYY-MM-DD-name>`;
//! - files with an unmapped extension stay where they are;
//! - subfolders are moved as a whole to `<unorganized>/<name>`, optionally
//!   date-prefixed as well.
//!
//! A failure on one entry is reported and the pass moves on. Only a missing
//! source folder, an inconsistent request, or a failure to list the source
//! stops the run.

use crate::date_resolver;
use crate::diagnostics::{DiagnosticSink, EntryKind, OrganizeEvent};
use crate::file_category::FileMapper;
use crate::file_organizer::{FileOrganizer, OrganizeError, OrganizeResult};
use crate::filename;
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Behavior switches for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeOptions {
    /// Date entries by creation time instead of modification time.
    pub use_creation_date: bool,
    /// Re-date files whose names already carry a valid date prefix.
    pub force_date: bool,
    /// Date-prefix subfolders moved to the unorganized root.
    pub date_folders: bool,
    /// Plan the pass without touching the filesystem.
    #[serde(skip)]
    pub dry_run: bool,
}

/// Everything one run needs. Read-only for the duration of the run.
pub struct OrganizeRequest<'a> {
    pub source: PathBuf,
    pub organized_root: PathBuf,
    pub unorganized_root: PathBuf,
    pub mapper: FileMapper,
    pub options: OrganizeOptions,
    pub sink: &'a dyn DiagnosticSink,
}

impl<'a> OrganizeRequest<'a> {
    pub fn new(
        source: impl Into<PathBuf>,
        organized_root: impl Into<PathBuf>,
        unorganized_root: impl Into<PathBuf>,
        mapper: FileMapper,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            source: source.into(),
            organized_root: organized_root.into(),
            unorganized_root: unorganized_root.into(),
            mapper,
            options: OrganizeOptions::default(),
            sink,
        }
    }

    pub fn with_options(mut self, options: OrganizeOptions) -> Self {
        self.options = options;
        self
    }

    /// Checks the preconditions of a run without touching the filesystem
    /// beyond a stat of the source.
    pub fn validate(&self) -> OrganizeResult<()> {
        if !self.source.is_dir() {
            return Err(OrganizeError::SourceFolderNotFound {
                path: self.source.clone(),
            });
        }

        let roots = [
            ("source", &self.source),
            ("organized root", &self.organized_root),
            ("unorganized root", &self.unorganized_root),
        ];
        for (i, (name_a, a)) in roots.iter().enumerate() {
            for (name_b, b) in &roots[i + 1..] {
                if same_path(a, b) {
                    return Err(OrganizeError::InvalidRequest {
                        reason: format!(
                            "{} and {} are the same path: {}",
                            name_a,
                            name_b,
                            a.display()
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    if a.components().eq(b.components()) {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Why an entry was left in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The entry is the organized or unorganized root itself.
    OutputFolder,
    /// No category lists the file's extension.
    NoCategory,
    /// Sanitizing the name left nothing usable.
    UnusableName,
    /// Neither a regular file nor a folder (broken link, socket, ...).
    NotRegularEntry,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OutputFolder => write!(f, "output folder"),
            SkipReason::NoCategory => write!(f, "no category for extension"),
            SkipReason::UnusableName => write!(f, "name is empty after sanitizing"),
            SkipReason::NotRegularEntry => write!(f, "not a regular file or folder"),
        }
    }
}

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Moved {
        kind: EntryKind,
        from: PathBuf,
        to: PathBuf,
    },
    Skipped(SkipReason),
    Failed(String),
}

/// A skipped or failed entry, kept for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryNote<R> {
    pub name: String,
    pub reason: R,
}

/// Totals of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizeReport {
    pub files_moved: usize,
    pub folders_moved: usize,
    pub skipped: Vec<EntryNote<SkipReason>>,
    pub failed: Vec<EntryNote<String>>,
    pub dry_run: bool,
}

impl OrganizeReport {
    fn record(&mut self, name: &str, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Moved {
                kind: EntryKind::File,
                ..
            } => self.files_moved += 1,
            EntryOutcome::Moved {
                kind: EntryKind::Folder,
                ..
            } => self.folders_moved += 1,
            EntryOutcome::Skipped(reason) => self.skipped.push(EntryNote {
                name: name.to_string(),
                reason,
            }),
            EntryOutcome::Failed(reason) => self.failed.push(EntryNote {
                name: name.to_string(),
                reason,
            }),
        }
    }

    /// True if no entry failed.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A direct child of the source folder, observed during one pass.
#[derive(Debug, Clone)]
struct SourceEntry {
    /// The name exactly as stored on disk.
    file_name: OsString,
    /// Lossy UTF-8 form, for classifying, sanitizing and messages.
    name: String,
    path: PathBuf,
}

/// Where an entry is going.
struct PlannedMove {
    kind: EntryKind,
    new_name: OsString,
    destination_dir: PathBuf,
}

/// Runs organizing passes.
pub struct DirectoryOrganizer<'r, 'a> {
    request: &'r OrganizeRequest<'a>,
    skip_names: Vec<OsString>,
}

impl<'r, 'a> DirectoryOrganizer<'r, 'a> {
    pub fn new(request: &'r OrganizeRequest<'a>) -> Self {
        let skip_names = [&request.organized_root, &request.unorganized_root]
            .iter()
            .filter_map(|root| root.file_name())
            .map(OsStr::to_os_string)
            .collect();
        Self {
            request,
            skip_names,
        }
    }

    /// Runs one pass over the source folder.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::SourceFolderNotFound`] or
    /// [`OrganizeError::InvalidRequest`] before anything is touched, and
    /// [`OrganizeError::ReadDirFailed`] if the source cannot be listed.
    /// Per-entry problems never surface here; they land in the report.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::diagnostics::NullSink;
    /// use dirsort::file_category::FileMapper;
    /// use dirsort::organizer::{DirectoryOrganizer, OrganizeRequest};
    ///
    /// let request = OrganizeRequest::new(
    ///     "/home/me/Downloads",
    ///     "/home/me/Downloads/Organized",
    ///     "/home/me/Downloads/Unorganized",
    ///     FileMapper::default(),
    ///     &NullSink,
    /// );
    /// let report = DirectoryOrganizer::new(&request).run()?;
    /// println!("{} files moved", report.files_moved);
    /// # Ok::<(), dirsort::OrganizeError>(())
    /// ```
    pub fn run(&self) -> OrganizeResult<OrganizeReport> {
        self.request.validate()?;

        let entries = self.list_entries()?;
        let sink = self.request.sink;
        sink.record(&OrganizeEvent::ScanStarted {
            source: self.request.source.clone(),
            entries: entries.len(),
        });

        let mut report = OrganizeReport {
            dry_run: self.request.options.dry_run,
            ..Default::default()
        };

        for entry in &entries {
            let outcome = self.process_entry(entry);
            match &outcome {
                EntryOutcome::Skipped(reason) => sink.record(&OrganizeEvent::EntrySkipped {
                    name: entry.name.clone(),
                    reason: reason.to_string(),
                }),
                EntryOutcome::Failed(reason) => sink.record(&OrganizeEvent::EntryFailed {
                    name: entry.name.clone(),
                    reason: reason.clone(),
                }),
                EntryOutcome::Moved { .. } => {}
            }
            report.record(&entry.name, outcome);
        }

        sink.record(&OrganizeEvent::Summary {
            files_moved: report.files_moved,
            folders_moved: report.folders_moved,
            dry_run: report.dry_run,
        });
        Ok(report)
    }

    /// Lists the direct children of the source, sorted by name.
    fn list_entries(&self) -> OrganizeResult<Vec<SourceEntry>> {
        let source = &self.request.source;
        let read_dir_failed = |e| OrganizeError::ReadDirFailed {
            path: source.clone(),
            source: e,
        };

        let mut entries = fs::read_dir(source)
            .map_err(read_dir_failed)?
            .map(|entry| {
                entry.map(|e| {
                    let file_name = e.file_name();
                    SourceEntry {
                        name: file_name.to_string_lossy().to_string(),
                        file_name,
                        path: e.path(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_dir_failed)?;

        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(entries)
    }

    fn process_entry(&self, entry: &SourceEntry) -> EntryOutcome {
        if self.skip_names.contains(&entry.file_name) {
            return EntryOutcome::Skipped(SkipReason::OutputFolder);
        }

        // Follows links, so a link to a file is handled as that file.
        let metadata = match fs::metadata(&entry.path) {
            Ok(metadata) => metadata,
            Err(_) if fs::symlink_metadata(&entry.path).is_ok() => {
                return EntryOutcome::Skipped(SkipReason::NotRegularEntry);
            }
            Err(e) => return EntryOutcome::Failed(e.to_string()),
        };

        let plan = if metadata.is_file() {
            self.plan_file(entry)
        } else if metadata.is_dir() {
            self.plan_folder(entry)
        } else {
            return EntryOutcome::Skipped(SkipReason::NotRegularEntry);
        };

        match plan {
            Ok(Ok(planned)) => self.execute(entry, planned),
            Ok(Err(reason)) => EntryOutcome::Skipped(reason),
            Err(e) => EntryOutcome::Failed(e.to_string()),
        }
    }

    fn plan_file(&self, entry: &SourceEntry) -> OrganizeResult<Result<PlannedMove, SkipReason>> {
        let options = &self.request.options;

        let Some(category) = self.request.mapper.classify_name(&entry.name) else {
            return Ok(Err(SkipReason::NoCategory));
        };

        let sanitized = filename::sanitize(&entry.name);
        if sanitized.is_empty() {
            return Ok(Err(SkipReason::UnusableName));
        }

        // An already-dated name is kept exactly as it is, unsanitized.
        let new_name = if filename::has_date_prefix(&sanitized) && !options.force_date {
            entry.file_name.clone()
        } else {
            let date = self.resolve_date(&entry.path)?;
            filename::create_dated_filename(&entry.name, date).into()
        };

        Ok(Ok(PlannedMove {
            kind: EntryKind::File,
            new_name,
            destination_dir: self.request.organized_root.join(category),
        }))
    }

    fn plan_folder(&self, entry: &SourceEntry) -> OrganizeResult<Result<PlannedMove, SkipReason>> {
        let new_name = if self.request.options.date_folders {
            if filename::sanitize(&entry.name).is_empty() {
                return Ok(Err(SkipReason::UnusableName));
            }
            let date = self.resolve_date(&entry.path)?;
            filename::create_dated_filename(&entry.name, date).into()
        } else {
            entry.file_name.clone()
        };

        Ok(Ok(PlannedMove {
            kind: EntryKind::Folder,
            new_name,
            destination_dir: self.request.unorganized_root.clone(),
        }))
    }

    fn resolve_date(&self, path: &Path) -> OrganizeResult<chrono::NaiveDate> {
        date_resolver::resolve_date(path, self.request.options.use_creation_date).map_err(|e| {
            OrganizeError::UnresolvableDate {
                path: path.to_path_buf(),
                source: e,
            }
        })
    }

    fn execute(&self, entry: &SourceEntry, planned: PlannedMove) -> EntryOutcome {
        let sink = self.request.sink;
        let destination = planned.destination_dir.join(&planned.new_name);

        if self.request.options.dry_run {
            if let Err(e) =
                FileOrganizer::check_destination(planned.kind == EntryKind::Folder, &destination)
            {
                return EntryOutcome::Failed(e.to_string());
            }
            sink.record(&OrganizeEvent::Planned {
                kind: planned.kind,
                old_name: entry.name.clone(),
                new_name: planned.new_name.to_string_lossy().to_string(),
                destination: planned.destination_dir,
            });
            return EntryOutcome::Moved {
                kind: planned.kind,
                from: entry.path.clone(),
                to: destination,
            };
        }

        if let Err(e) = FileOrganizer::move_entry(&entry.path, &destination, sink) {
            return EntryOutcome::Failed(e.to_string());
        }

        let event = match planned.kind {
            EntryKind::File => OrganizeEvent::FileMoved {
                old_name: entry.name.clone(),
                new_name: planned.new_name.to_string_lossy().to_string(),
                destination: planned.destination_dir,
            },
            EntryKind::Folder => OrganizeEvent::FolderMoved {
                old_name: entry.name.clone(),
                new_name: planned.new_name.to_string_lossy().to_string(),
                destination: planned.destination_dir,
            },
        };
        sink.record(&event);

        EntryOutcome::Moved {
            kind: planned.kind,
            from: entry.path.clone(),
            to: destination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::file_category::Category;
    use tempfile::TempDir;

    fn mapper() -> FileMapper {
        FileMapper::new(vec![Category::new("images", &[".jpg"])])
    }

    #[test]
    fn test_validate_rejects_missing_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let sink = MemorySink::new();
        let request = OrganizeRequest::new(
            temp_dir.path().join("missing"),
            temp_dir.path().join("o"),
            temp_dir.path().join("u"),
            mapper(),
            &sink,
        );
        assert!(matches!(
            request.validate(),
            Err(OrganizeError::SourceFolderNotFound { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_identical_roots() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let sink = MemorySink::new();
        let out = temp_dir.path().join("out");
        let request =
            OrganizeRequest::new(temp_dir.path(), out.clone(), out, mapper(), &sink);
        assert!(matches!(
            request.validate(),
            Err(OrganizeError::InvalidRequest { .. })
        ));

        let request = OrganizeRequest::new(
            temp_dir.path(),
            temp_dir.path(),
            temp_dir.path().join("u"),
            mapper(),
            &sink,
        );
        assert!(matches!(
            request.validate(),
            Err(OrganizeError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_skip_names_are_root_basenames() {
        let sink = MemorySink::new();
        let request = OrganizeRequest::new(
            "/data/in",
            "/elsewhere/Organized",
            "/data/in/Unorganized",
            mapper(),
            &sink,
        );
        let organizer = DirectoryOrganizer::new(&request);
        assert_eq!(organizer.skip_names, vec!["Organized", "Unorganized"]);
    }

    #[test]
    fn test_report_record_counts_by_kind() {
        let mut report = OrganizeReport::default();
        report.record(
            "a.jpg",
            EntryOutcome::Moved {
                kind: EntryKind::File,
                from: PathBuf::from("a.jpg"),
                to: PathBuf::from("x/a.jpg"),
            },
        );
        report.record(
            "dir",
            EntryOutcome::Moved {
                kind: EntryKind::Folder,
                from: PathBuf::from("dir"),
                to: PathBuf::from("u/dir"),
            },
        );
        report.record("b.txt", EntryOutcome::Skipped(SkipReason::NoCategory));
        report.record("c.jpg", EntryOutcome::Failed("denied".into()));

        assert_eq!(report.files_moved, 1);
        assert_eq!(report.folders_moved, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.failed[0].name, "c.jpg");
        assert!(!report.is_complete_success());
    }

    #[test]
    fn test_dry_run_leaves_filesystem_untouched() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("in");
        fs::create_dir(&source).expect("Failed to create source");
        fs::write(source.join("photo.jpg"), "x").expect("Failed to write file");
        fs::create_dir(source.join("notes")).expect("Failed to create subdir");

        let sink = MemorySink::new();
        let request = OrganizeRequest::new(
            &source,
            temp_dir.path().join("o"),
            temp_dir.path().join("u"),
            mapper(),
            &sink,
        )
        .with_options(OrganizeOptions {
            dry_run: true,
            ..Default::default()
        });

        let report = DirectoryOrganizer::new(&request)
            .run()
            .expect("Dry run failed");

        assert!(report.dry_run);
        assert_eq!(report.files_moved, 1);
        assert_eq!(report.folders_moved, 1);
        assert!(source.join("photo.jpg").exists());
        assert!(source.join("notes").exists());
        assert!(!temp_dir.path().join("o").exists());
        assert!(!temp_dir.path().join("u").exists());

        let planned = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, OrganizeEvent::Planned { .. }))
            .count();
        assert_eq!(planned, 2);
    }
}
