/*!
 * Core types and data structures for projdump
 */

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use glob_match::glob_match;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

/// Name-based filters applied while walking a project
///
/// The value is kept exactly as supplied so it round-trips through the
/// history and template stores; normalisation happens when matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Bare directory names excluded anywhere in the tree
    #[serde(default)]
    pub ignored_dirs: BTreeSet<String>,
    /// Bare file names excluded anywhere in the tree
    #[serde(default)]
    pub ignored_files: BTreeSet<String>,
    /// Extensions whose content is dumped; empty means every file
    #[serde(default)]
    pub allowed_extensions: BTreeSet<String>,
}

impl FilterConfig {
    /// Build a filter from anything yielding names
    pub fn new<D, F, E>(ignored_dirs: D, ignored_files: F, allowed_extensions: E) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            ignored_dirs: ignored_dirs.into_iter().map(Into::into).collect(),
            ignored_files: ignored_files.into_iter().map(Into::into).collect(),
            allowed_extensions: allowed_extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a directory with this bare name is pruned
    pub fn is_ignored_dir(&self, name: &str) -> bool {
        matches_any(&self.ignored_dirs, name)
    }

    /// Whether a file with this bare name is omitted
    pub fn is_ignored_file(&self, name: &str) -> bool {
        matches_any(&self.ignored_files, name)
    }

    /// Whether the content of `path` belongs in the report
    pub fn allows_content(&self, path: &Path) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }

        let Some(ext) = extension_of(path) else {
            return false;
        };

        self.allowed_extensions
            .iter()
            .any(|allowed| normalize_extension(allowed) == ext)
    }
}

/// Lowercase extension of a path including the leading dot
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Accepts both `py` and `.PY` spellings
fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn matches_any(patterns: &BTreeSet<String>, name: &str) -> bool {
    // A literal name always matches itself, even when it looks like a glob
    patterns
        .iter()
        .any(|pattern| pattern == name || (is_glob(pattern) && glob_match(pattern, name)))
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(&['*', '?', '['][..])
}

/// Kind of an entry that survived filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A real directory that is descended into
    Directory,
    /// A symlink to a directory inside the root; listed, never descended
    LinkedDirectory,
    /// A regular file, or a symlink to one inside the root
    File,
}

impl EntryKind {
    /// Directories and linked directories sort before files
    pub fn is_dir_like(self) -> bool {
        !matches!(self, Self::File)
    }
}

/// A filesystem entry visited during a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Bare name
    pub name: String,
    /// Absolute path (under the canonical root)
    pub path: PathBuf,
    /// What the entry is
    pub kind: EntryKind,
}

/// Body of a content section in the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkBody {
    /// File decoded as UTF-8
    Text(String),
    /// File is not valid UTF-8
    Binary,
    /// File could not be read at all
    Error(String),
}

/// A file visited by the content pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVisit {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Section body to write; `None` when the file contributes no section
    pub body: Option<ChunkBody>,
    /// What happened to the file
    pub outcome: EntryOutcome,
}

/// Why an entry contributed no content
///
/// `as_ref()` yields a short snake_case label used to group skips.
#[derive(Debug, Clone, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// Extension not in the allow-list
    ExtensionNotAllowed,
    /// Not valid UTF-8
    Binary,
    /// File or directory could not be read
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtensionNotAllowed => write!(f, "extension not allowed"),
            Self::Binary => write!(f, "binary or non-UTF-8"),
            Self::Unreadable(message) => write!(f, "unreadable: {}", message),
        }
    }
}

/// Per-entry result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Content was written to the report
    Included {
        /// Number of lines in the file
        lines: usize,
        /// Number of characters in the file
        chars: usize,
    },
    /// Entry contributed no content
    Skipped(SkipReason),
}
