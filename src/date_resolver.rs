/// Timestamp lookup for date prefixes.
///
/// A file is dated by its last-modified time, or by its creation time when the
/// caller asks for it. Platforms without a birth time fall back to the Unix
/// status-change time, then to the modification time.
use chrono::{DateTime, Local, NaiveDate};
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Which timestamp of an entry dates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Modified,
    Created,
}

impl DateSource {
    pub fn from_flag(use_creation_date: bool) -> Self {
        if use_creation_date {
            DateSource::Created
        } else {
            DateSource::Modified
        }
    }
}

/// Returns the local timestamp of `path` from the requested source.
///
/// Fails only when the entry cannot be stat'ed, e.g. because it vanished after
/// the directory was listed.
pub fn resolve(path: &Path, use_creation_date: bool) -> io::Result<DateTime<Local>> {
    let metadata = fs::metadata(path)?;
    let time = match DateSource::from_flag(use_creation_date) {
        DateSource::Modified => metadata.modified()?,
        DateSource::Created => creation_time(&metadata)?,
    };
    Ok(DateTime::<Local>::from(time))
}

/// Calendar date used for the `YYYY-MM-DD-` prefix of `path`.
pub fn resolve_date(path: &Path, use_creation_date: bool) -> io::Result<NaiveDate> {
    resolve(path, use_creation_date).map(|ts| ts.date_naive())
}

fn creation_time(metadata: &Metadata) -> io::Result<SystemTime> {
    if let Ok(created) = metadata.created() {
        return Ok(created);
    }
    status_change_time(metadata)
}

#[cfg(unix)]
fn status_change_time(metadata: &Metadata) -> io::Result<SystemTime> {
    use std::os::unix::fs::MetadataExt;
    use std::time::Duration;

    let secs = metadata.ctime();
    let nanos = metadata.ctime_nsec().clamp(0, 999_999_999) as u32;
    let since_epoch = Duration::new(secs.unsigned_abs(), nanos);
    if secs >= 0 {
        Ok(SystemTime::UNIX_EPOCH + since_epoch)
    } else {
        Ok(SystemTime::UNIX_EPOCH - since_epoch)
    }
}

#[cfg(not(unix))]
fn status_change_time(metadata: &Metadata) -> io::Result<SystemTime> {
    metadata.modified()
}
