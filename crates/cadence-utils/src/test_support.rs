//! Fixtures shared by unit and integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Check whether tests that shell out to a real package manager should run.
///
/// `CADENCE_SKIP_REAL_TASKS=1` always disables them.
/// `CADENCE_REAL_TASKS=1` enables them.
#[must_use]
pub fn real_tasks_enabled() -> bool {
    let flag = |name: &str| {
        std::env::var(name)
            .ok()
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
    if flag("CADENCE_SKIP_REAL_TASKS") {
        return false;
    }
    flag("CADENCE_REAL_TASKS")
}

/// A throwaway project directory.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create fixture dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Create each directory with a placeholder file inside it.
    #[must_use]
    pub fn with_dirs(self, dirs: &[&str]) -> Self {
        for dir in dirs {
            let path = self.join(dir);
            fs::create_dir_all(&path).expect("create fixture subdir");
            fs::write(path.join(".keep"), "").expect("write placeholder");
        }
        self
    }

    #[must_use]
    pub fn with_file(self, relative: &str, contents: &str) -> Self {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture parent");
        }
        fs::write(path, contents).expect("write fixture file");
        self
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Write an executable shell script named `name` into `dir`.
///
/// Stands in for a package manager binary in subprocess tests.
#[cfg(unix)]
pub fn write_fake_executable(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake executable");
    let mut perms = fs::metadata(&path).expect("stat fake executable").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod fake executable");
    path
}
