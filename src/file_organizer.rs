/// Filesystem moves for organized entries.
///
/// This module owns the error type of the organizing engine and the single move
/// primitive every relocation goes through. A move creates the destination's
/// parent folders, then renames the entry; when the rename crosses devices it
/// falls back to copy-then-remove.
use crate::diagnostics::{DiagnosticSink, OrganizeEvent};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Errors that can occur while organizing a directory.
#[derive(Debug)]
pub enum OrganizeError {
    /// The source directory does not exist.
    SourceFolderNotFound { path: PathBuf },
    /// The request itself is inconsistent (e.g. two roots are the same path).
    InvalidRequest { reason: String },
    /// Listing the source directory failed.
    ReadDirFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to create a destination directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to move an entry to its destination.
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// The destination is occupied by something the move must not replace.
    DestinationConflict { path: PathBuf },
    /// The entry's timestamp could not be read.
    UnresolvableDate {
        path: PathBuf,
        source: io::Error,
    },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceFolderNotFound { path } => {
                write!(f, "Source folder not found: {}", path.display())
            }
            Self::InvalidRequest { reason } => write!(f, "Invalid request: {}", reason),
            Self::ReadDirFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::MoveFailed {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::DestinationConflict { path } => {
                write!(f, "Destination already exists: {}", path.display())
            }
            Self::UnresolvableDate { path, source } => {
                write!(f, "Cannot read date of {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadDirFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::UnresolvableDate { source, .. } => Some(source),
            Self::MoveFailed { source_error, .. } => Some(source_error),
            _ => None,
        }
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Moves files and folders to their destinations.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Moves `source_path` to `dest_path`, creating the destination's parent
    /// folders first.
    ///
    /// Each created folder is reported to `sink` as [`OrganizeEvent::FolderCreated`].
    /// A file replaces an existing file at the destination. Any other occupant
    /// (a folder in place of a file, anything in place of a folder) is a
    /// [`OrganizeError::DestinationConflict`]. Nothing is retried.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::diagnostics::NullSink;
    /// use dirsort::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let result = FileOrganizer::move_entry(
    ///     Path::new("/downloads/photo.jpg"),
    ///     Path::new("/downloads/Organized/images/2024-03-01-photo.jpg"),
    ///     &NullSink,
    /// );
    /// if let Err(e) = result {
    ///     eprintln!("Move failed: {}", e);
    /// }
    /// ```
    pub fn move_entry(
        source_path: &Path,
        dest_path: &Path,
        sink: &dyn DiagnosticSink,
    ) -> OrganizeResult<()> {
        let source_meta =
            fs::symlink_metadata(source_path).map_err(|e| OrganizeError::MoveFailed {
                source: source_path.to_path_buf(),
                destination: dest_path.to_path_buf(),
                source_error: e,
            })?;
        Self::check_destination(source_meta.is_dir(), dest_path)?;

        if let Some(parent) = dest_path.parent() {
            Self::ensure_dir(parent, sink)?;
        }

        match fs::rename(source_path, dest_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                Self::copy_then_remove(source_path, dest_path, source_meta.file_type()).map_err(
                    |copy_error| OrganizeError::MoveFailed {
                        source: source_path.to_path_buf(),
                        destination: dest_path.to_path_buf(),
                        source_error: copy_error,
                    },
                )
            }
            Err(e) => Err(OrganizeError::MoveFailed {
                source: source_path.to_path_buf(),
                destination: dest_path.to_path_buf(),
                source_error: e,
            }),
        }
    }

    /// Fails if `dest_path` is occupied by something a move of this kind may
    /// not replace.
    pub fn check_destination(source_is_dir: bool, dest_path: &Path) -> OrganizeResult<()> {
        match fs::symlink_metadata(dest_path) {
            Err(_) => Ok(()),
            Ok(meta) if !source_is_dir && !meta.is_dir() => Ok(()),
            Ok(_) => Err(OrganizeError::DestinationConflict {
                path: dest_path.to_path_buf(),
            }),
        }
    }

    /// Creates `dir` and any missing ancestors, reporting each one created.
    pub fn ensure_dir(dir: &Path, sink: &dyn DiagnosticSink) -> OrganizeResult<()> {
        if dir.as_os_str().is_empty() || dir.is_dir() {
            return Ok(());
        }

        let missing: Vec<&Path> = dir.ancestors().take_while(|p| !p.exists()).collect();

        fs::create_dir_all(dir).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        for created in missing.into_iter().rev() {
            sink.record(&OrganizeEvent::FolderCreated {
                path: created.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Cross-device fallback: copy everything, then remove the original.
    ///
    /// A failed copy removes whatever it already wrote, so the entry is either
    /// moved completely or left only at its source.
    fn copy_then_remove(
        source_path: &Path,
        dest_path: &Path,
        file_type: fs::FileType,
    ) -> io::Result<()> {
        if file_type.is_dir() {
            fs::create_dir(dest_path)?;
            if let Err(e) = Self::copy_tree(source_path, dest_path) {
                let _ = fs::remove_dir_all(dest_path);
                return Err(e);
            }
            return fs::remove_dir_all(source_path);
        }

        let replaces_existing = fs::symlink_metadata(dest_path).is_ok();
        if let Err(e) = Self::copy_one(source_path, dest_path, file_type) {
            if !replaces_existing {
                let _ = fs::remove_file(dest_path);
            }
            return Err(e);
        }
        fs::remove_file(source_path)
    }

    /// Copies the contents of `source_dir` into the existing `dest_dir`.
    /// Links are recreated as links, never followed.
    fn copy_tree(source_dir: &Path, dest_dir: &Path) -> io::Result<()> {
        for entry in WalkDir::new(source_dir).min_depth(1) {
            let entry = entry.map_err(io::Error::other)?;
            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .map_err(io::Error::other)?;
            let target = dest_dir.join(relative);
            if entry.file_type().is_dir() {
                fs::create_dir(&target)?;
            } else {
                Self::copy_one(entry.path(), &target, entry.file_type())?;
            }
        }
        Ok(())
    }

    fn copy_one(source_path: &Path, dest_path: &Path, file_type: fs::FileType) -> io::Result<()> {
        if file_type.is_symlink() {
            return copy_symlink(source_path, dest_path);
        }
        fs::copy(source_path, dest_path).map(|_| ())
    }
}

#[cfg(unix)]
fn copy_symlink(source_path: &Path, dest_path: &Path) -> io::Result<()> {
    let target = fs::read_link(source_path)?;
    if fs::symlink_metadata(dest_path).is_ok() {
        fs::remove_file(dest_path)?;
    }
    std::os::unix::fs::symlink(target, dest_path)
}

#[cfg(windows)]
fn copy_symlink(source_path: &Path, dest_path: &Path) -> io::Result<()> {
    use std::os::windows::fs::{symlink_dir, symlink_file};

    let target = fs::read_link(source_path)?;
    if fs::metadata(source_path).is_ok_and(|m| m.is_dir()) {
        symlink_dir(target, dest_path)
    } else {
        symlink_file(target, dest_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{MemorySink, NullSink};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_move_entry_creates_parent_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let file_path = base_path.join("test.txt");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let dest = base_path.join("Organized").join("documents").join("test.txt");
        let sink = MemorySink::new();
        FileOrganizer::move_entry(&file_path, &dest, &sink).expect("Failed to move file");

        assert!(!file_path.exists());
        assert!(dest.is_file());

        let created: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                OrganizeEvent::FolderCreated { path } => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(
            created,
            vec![
                base_path.join("Organized"),
                base_path.join("Organized").join("documents")
            ]
        );
    }

    #[test]
    fn test_move_entry_uses_existing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let category_dir = base_path.join("images");
        fs::create_dir(&category_dir).expect("Failed to create category directory");

        let file_path = base_path.join("test.png");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let sink = MemorySink::new();
        FileOrganizer::move_entry(&file_path, &category_dir.join("test.png"), &sink)
            .expect("Failed to move file");

        assert!(!file_path.exists());
        assert!(category_dir.join("test.png").exists());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_move_entry_overwrites_existing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let file_path = base_path.join("a.txt");
        fs::write(&file_path, "new").expect("Failed to write test file");
        let dest = base_path.join("out").join("a.txt");
        fs::create_dir(base_path.join("out")).expect("Failed to create dir");
        fs::write(&dest, "old").expect("Failed to write existing file");

        FileOrganizer::move_entry(&file_path, &dest, &NullSink).expect("Failed to move file");
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_move_entry_moves_directory_as_unit() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let dir = base_path.join("notes");
        fs::create_dir_all(dir.join("nested")).expect("Failed to create dirs");
        fs::write(dir.join("nested").join("n.txt"), "x").expect("Failed to write file");

        let dest = base_path.join("Unorganized").join("notes");
        FileOrganizer::move_entry(&dir, &dest, &NullSink).expect("Failed to move folder");

        assert!(!dir.exists());
        assert!(dest.join("nested").join("n.txt").is_file());
    }

    #[test]
    fn test_move_directory_onto_existing_is_conflict() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let dir = base_path.join("notes");
        fs::create_dir(&dir).expect("Failed to create dir");
        let dest = base_path.join("Unorganized").join("notes");
        fs::create_dir_all(&dest).expect("Failed to create dest");

        let result = FileOrganizer::move_entry(&dir, &dest, &NullSink);
        assert!(matches!(
            result,
            Err(OrganizeError::DestinationConflict { .. })
        ));
        assert!(dir.exists());
    }

    #[test]
    fn test_move_file_onto_directory_is_conflict() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let file_path = base_path.join("a.txt");
        fs::write(&file_path, "x").expect("Failed to write test file");
        let dest = base_path.join("out").join("a.txt");
        fs::create_dir_all(&dest).expect("Failed to create dest dir");

        let result = FileOrganizer::move_entry(&file_path, &dest, &NullSink);
        assert!(matches!(
            result,
            Err(OrganizeError::DestinationConflict { .. })
        ));
        assert!(file_path.exists());
    }

    #[test]
    fn test_move_missing_source_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let result = FileOrganizer::move_entry(
            &base_path.join("gone.txt"),
            &base_path.join("out").join("gone.txt"),
            &NullSink,
        );
        assert!(matches!(result, Err(OrganizeError::MoveFailed { .. })));
        assert!(!base_path.join("out").exists());
    }

    #[test]
    fn test_copy_then_remove_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let dir = base_path.join("src");
        fs::create_dir_all(dir.join("a").join("b")).expect("Failed to create dirs");
        fs::write(dir.join("top.txt"), "1").expect("Failed to write file");
        fs::write(dir.join("a").join("b").join("deep.txt"), "2").expect("Failed to write file");

        let dest = base_path.join("dst");
        let file_type = fs::symlink_metadata(&dir).unwrap().file_type();
        FileOrganizer::copy_then_remove(&dir, &dest, file_type).expect("Failed to copy");

        assert!(!dir.exists());
        assert_eq!(fs::read_to_string(dest.join("top.txt")).unwrap(), "1");
        assert_eq!(
            fs::read_to_string(dest.join("a").join("b").join("deep.txt")).unwrap(),
            "2"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_then_remove_keeps_links_as_links() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        fs::create_dir(base_path.join("elsewhere")).expect("Failed to create dir");
        fs::write(base_path.join("target.txt"), "t").expect("Failed to write file");

        let dir = base_path.join("src");
        fs::create_dir(&dir).expect("Failed to create dir");
        fs::write(dir.join("a.txt"), "a").expect("Failed to write file");
        symlink("../elsewhere", dir.join("zlink")).expect("Failed to create dir link");
        symlink("../target.txt", dir.join("flink")).expect("Failed to create file link");

        let dest = base_path.join("dst");
        let file_type = fs::symlink_metadata(&dir).unwrap().file_type();
        FileOrganizer::copy_then_remove(&dir, &dest, file_type).expect("Failed to copy");

        assert!(!dir.exists());
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "a");
        assert_eq!(
            fs::read_link(dest.join("zlink")).unwrap(),
            PathBuf::from("../elsewhere")
        );
        assert_eq!(
            fs::read_link(dest.join("flink")).unwrap(),
            PathBuf::from("../target.txt")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_copy_leaves_no_partial_destination() {
        use std::os::unix::net::UnixListener;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let dir = base_path.join("src");
        fs::create_dir(&dir).expect("Failed to create dir");
        fs::write(dir.join("a.txt"), "a").expect("Failed to write file");
        // A socket cannot be copied.
        let _listener = UnixListener::bind(dir.join("sock")).expect("Failed to bind socket");

        let dest = base_path.join("dst");
        let file_type = fs::symlink_metadata(&dir).unwrap().file_type();
        let result = FileOrganizer::copy_then_remove(&dir, &dest, file_type);

        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(dir.join("a.txt").is_file());
    }

    #[test]
    fn test_error_display() {
        let err = OrganizeError::SourceFolderNotFound {
            path: PathBuf::from("/nope"),
        };
        assert_eq!(err.to_string(), "Source folder not found: /nope");
    }
}
