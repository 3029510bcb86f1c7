//! Splicing snippets into existing text.
//!
//! [`insert_into_string`] is pure; [`insert_into_file`] wraps it with a
//! read-modify-write against the filesystem. Both are idempotent unless
//! `force` is set: text that already contains the snippet is left alone.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::atomic_write::write_atomic;
use crate::error::InsertError;

/// Line ending of the host platform.
#[cfg(windows)]
pub const PLATFORM_EOL: &str = "\r\n";
/// Line ending of the host platform.
#[cfg(not(windows))]
pub const PLATFORM_EOL: &str = "\n";

/// Locates the anchor point for a before/after insertion.
#[derive(Debug, Clone)]
pub enum Marker {
    Literal(String),
    Pattern(Regex),
}

impl Marker {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Compile `pattern` into a regex marker.
    pub fn pattern(pattern: &str) -> Result<Self, InsertError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|e| InsertError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Byte range of the first occurrence in `haystack`.
    fn find(&self, haystack: &str) -> Option<(usize, usize)> {
        match self {
            Self::Literal(text) => haystack.find(text.as_str()).map(|i| (i, i + text.len())),
            Self::Pattern(regex) => regex.find(haystack).map(|m| (m.start(), m.end())),
        }
    }
}

impl From<&str> for Marker {
    fn from(text: &str) -> Self {
        Self::Literal(text.to_string())
    }
}

impl From<Regex> for Marker {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

/// Where the snippet goes.
#[derive(Debug, Clone, Default)]
pub enum Anchor {
    /// Append to the end of the text.
    #[default]
    End,
    /// Immediately before the first match of the marker.
    Before(Marker),
    /// Immediately after the first match of the marker.
    After(Marker),
}

#[derive(Debug, Clone)]
pub struct InsertOptions {
    pub anchor: Anchor,
    /// Insert even when the snippet is already present.
    pub force: bool,
    /// Appended after the snippet for before/after anchors.
    pub eol: String,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            anchor: Anchor::End,
            force: false,
            eol: "\n".to_string(),
        }
    }
}

impl InsertOptions {
    pub fn before(marker: impl Into<Marker>) -> Self {
        Self {
            anchor: Anchor::Before(marker.into()),
            ..Self::default()
        }
    }

    pub fn after(marker: impl Into<Marker>) -> Self {
        Self {
            anchor: Anchor::After(marker.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn eol(mut self, eol: impl Into<String>) -> Self {
        self.eol = eol.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertResult {
    pub source: String,
    pub contents: String,
    pub inserted: bool,
}

/// Insert `insertion` into `source` according to `options`.
///
/// Returns the original and resulting text; `inserted` is true only when
/// they differ. A marker that matches nothing leaves the text unchanged.
pub fn insert_into_string(source: &str, insertion: &str, options: &InsertOptions) -> InsertResult {
    let already_present = source.contains(insertion);
    let should_insert = options.force || !already_present;

    let contents = if !should_insert {
        source.to_string()
    } else {
        match &options.anchor {
            Anchor::End => format!("{source}{insertion}"),
            Anchor::Before(marker) => match marker.find(source) {
                Some((start, _)) => splice(source, start, insertion, &options.eol),
                None => source.to_string(),
            },
            Anchor::After(marker) => match marker.find(source) {
                Some((_, end)) => splice(source, end, insertion, &options.eol),
                None => source.to_string(),
            },
        }
    };

    let inserted = contents != source;
    InsertResult {
        source: source.to_string(),
        contents,
        inserted,
    }
}

fn splice(source: &str, at: usize, insertion: &str, eol: &str) -> String {
    let mut out = String::with_capacity(source.len() + insertion.len() + eol.len());
    out.push_str(&source[..at]);
    out.push_str(insertion);
    out.push_str(eol);
    out.push_str(&source[at..]);
    out
}

#[derive(Debug, Clone)]
pub struct FileInsertOptions {
    pub anchor: Anchor,
    pub force: bool,
    /// Create the file (and its parents) when absent.
    pub create: bool,
    /// Defaults to [`PLATFORM_EOL`].
    pub eol: Option<String>,
}

impl Default for FileInsertOptions {
    fn default() -> Self {
        Self {
            anchor: Anchor::End,
            force: false,
            create: true,
            eol: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInsertResult {
    pub path: PathBuf,
    pub original_contents: String,
    pub contents: String,
    pub inserted: bool,
}

/// Insert `insertion` into the file at `path`.
///
/// The file is written only when the contents actually change.
pub async fn insert_into_file(
    path: &Path,
    insertion: &str,
    options: &FileInsertOptions,
) -> Result<FileInsertResult, InsertError> {
    let mut result = FileInsertResult {
        path: path.to_path_buf(),
        original_contents: String::new(),
        contents: String::new(),
        inserted: false,
    };

    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| InsertError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !exists && !options.create {
        debug!(path = %path.display(), "File absent and creation disabled; skipping insert");
        return Ok(result);
    }

    if exists {
        result.original_contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| InsertError::Read {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
    }

    let string_options = InsertOptions {
        anchor: options.anchor.clone(),
        force: options.force,
        eol: options
            .eol
            .clone()
            .unwrap_or_else(|| PLATFORM_EOL.to_string()),
    };
    let spliced = insert_into_string(&result.original_contents, insertion, &string_options);
    result.contents = spliced.contents;
    result.inserted = spliced.inserted;

    if result.inserted {
        let target = path.to_path_buf();
        let contents = result.contents.clone();
        tokio::task::spawn_blocking(move || write_atomic(&target, &contents))
            .await
            .map_err(|e| InsertError::Write {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
            .map_err(|e| InsertError::Write {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        debug!(path = %path.display(), "Inserted content into file");
    }

    Ok(result)
}
