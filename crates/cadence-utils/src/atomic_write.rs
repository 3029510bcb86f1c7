//! Atomic file replacement.
//!
//! Content is written to a sibling temp file, fsynced, then persisted over the
//! target. Bytes are written exactly as given: line endings are the caller's
//! decision, so a file that uses CRLF stays CRLF.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// What happened while replacing a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomicWriteOutcome {
    /// Number of persist retries (Windows only; files held open by scanners).
    pub retries: u32,
    /// The temp file lived on another filesystem and was copied instead.
    pub cross_filesystem: bool,
}

/// Replace `path` with `content`, creating parent directories as needed.
pub fn write_atomic(path: &Path, content: &str) -> io::Result<AtomicWriteOutcome> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;

    let mut outcome = AtomicWriteOutcome::default();
    match persist(temp, path) {
        Ok(retries) => outcome.retries = retries,
        Err((err, temp)) if is_cross_device(&err) => {
            warn!(path = %path.display(), "Rename crossed filesystems, copying instead");
            outcome.cross_filesystem = true;
            copy_into_place(temp.path(), path)?;
        }
        Err((err, _)) => return Err(err),
    }

    debug!(
        path = %path.display(),
        bytes = content.len(),
        retries = outcome.retries,
        "Wrote file atomically"
    );
    Ok(outcome)
}

#[cfg(not(windows))]
fn persist(temp: NamedTempFile, target: &Path) -> Result<u32, (io::Error, NamedTempFile)> {
    temp.persist(target).map(|_| 0).map_err(|e| (e.error, e.file))
}

#[cfg(windows)]
fn persist(mut temp: NamedTempFile, target: &Path) -> Result<u32, (io::Error, NamedTempFile)> {
    use std::thread;
    use std::time::Duration;

    // Bounded backoff: 10, 20, 40, 80 ms.
    const MAX_RETRIES: u32 = 4;

    let mut retries = 0;
    loop {
        match temp.persist(target) {
            Ok(_) => return Ok(retries),
            Err(e) if retries < MAX_RETRIES && e.error.kind() == io::ErrorKind::PermissionDenied => {
                thread::sleep(Duration::from_millis(10 * 2_u64.pow(retries)));
                retries += 1;
                temp = e.file;
            }
            Err(e) => return Err((e.error, e.file)),
        }
    }
}

#[cfg(unix)]
fn is_cross_device(err: &io::Error) -> bool {
    // EXDEV
    err.raw_os_error() == Some(18)
}

#[cfg(not(unix))]
fn is_cross_device(_err: &io::Error) -> bool {
    false
}

fn copy_into_place(source: &Path, target: &Path) -> io::Result<()> {
    let bytes = fs::read(source)?;
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(&bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(target).map_err(|e| e.error)?;
    Ok(())
}
