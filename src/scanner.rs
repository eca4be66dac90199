/*!
 * Directory walking for the structure and content passes
 *
 * Both passes share one pruning rule (see [`Scanner::classify`]) and one
 * sibling order: directories first, then files, each group sorted by
 * case-insensitive name. The passes are exposed as lazy iterators so the
 * writer decides where the output goes.
 */

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::types::{ChunkBody, EntryKind, EntryOutcome, FileVisit, FilterConfig, SkipReason, TreeEntry};

/// Connector for every sibling but the last
pub const TEE: &str = "├── ";
/// Connector for the last sibling
pub const CORNER: &str = "└── ";
/// Indentation below a sibling that has more siblings after it
pub const PIPE_INDENT: &str = "│   ";
/// Indentation below a last sibling
pub const BLANK_INDENT: &str = "    ";
/// Leaf rendered under a directory that could not be listed
pub const NO_ACCESS: &str = "<no access>";

/// Walker over a project root
pub struct Scanner {
    /// Canonical root directory
    root: PathBuf,
    /// Name filters
    filters: FilterConfig,
    /// A path never listed nor dumped (the report being written)
    excluded: Option<PathBuf>,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
}

impl Scanner {
    /// Create a scanner over `root`, which is canonicalised
    pub fn new(root: &Path, filters: FilterConfig) -> io::Result<Self> {
        Ok(Self {
            root: fs::canonicalize(root)?,
            filters,
            excluded: None,
            progress: Arc::new(ProgressBar::hidden()),
        })
    }

    /// Never list nor dump `path`
    pub fn with_excluded_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded = Some(path.into());
        self
    }

    /// Report progress to `progress`
    pub fn with_progress(mut self, progress: Arc<ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    /// Canonical root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Display name of the root: its last component, or the whole path for `/`
    pub fn root_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    /// Decide whether an entry takes part in the walk, and as what
    ///
    /// Entries are dropped when their bare name is excluded, when they are
    /// the excluded report path, when they are neither file nor directory,
    /// or when they are symlinks resolving outside the root.
    pub fn classify(&self, path: &Path, file_type: fs::FileType) -> Option<EntryKind> {
        if self.excluded.as_deref() == Some(path) {
            return None;
        }

        let kind = if file_type.is_symlink() {
            let target = fs::canonicalize(path).ok()?;
            if !target.starts_with(&self.root) {
                debug!("Pruning {} (resolves outside root)", path.display());
                return None;
            }
            if self.excluded.as_deref() == Some(target.as_path()) {
                return None;
            }
            let metadata = fs::metadata(path).ok()?;
            if metadata.is_dir() {
                EntryKind::LinkedDirectory
            } else if metadata.is_file() {
                EntryKind::File
            } else {
                return None;
            }
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            return None;
        };

        let name = path.file_name().unwrap_or_default().to_string_lossy();
        let ignored = if kind.is_dir_like() {
            self.filters.is_ignored_dir(&name)
        } else {
            self.filters.is_ignored_file(&name)
        };

        if ignored {
            debug!("Ignoring {}", path.display());
            None
        } else {
            Some(kind)
        }
    }

    /// List the surviving children of `dir` in render order
    pub fn list_children(&self, dir: &Path) -> io::Result<Vec<TreeEntry>> {
        let mut children = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if let Some(kind) = self.classify(&path, file_type) {
                children.push(TreeEntry {
                    name: entry.file_name().to_string_lossy().to_string(),
                    path,
                    kind,
                });
            }
        }

        children.sort_by(|a, b| sibling_order(&a.name, a.kind.is_dir_like(), &b.name, b.kind.is_dir_like()));
        Ok(children)
    }

    /// Lazily render the project structure, one line per item
    pub fn structure(&self) -> StructureLines<'_> {
        StructureLines::new(self)
    }

    /// Lazily visit every surviving file in render order
    pub fn contents(&self) -> ContentVisits<'_> {
        ContentVisits::new(self)
    }

    /// Read one file into a report section
    fn visit_file(&self, path: &Path) -> FileVisit {
        self.progress.inc(1);
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        self.progress.set_message(format!("Current file: {}", file_name));

        if !self.filters.allows_content(path) {
            return FileVisit {
                path: path.to_path_buf(),
                body: None,
                outcome: EntryOutcome::Skipped(SkipReason::ExtensionNotAllowed),
            };
        }

        let (body, outcome) = match fs::read(path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => {
                    let outcome = EntryOutcome::Included {
                        lines: text.lines().count(),
                        chars: text.chars().count(),
                    };
                    (ChunkBody::Text(text), outcome)
                }
                Err(_) => {
                    debug!("{} is not valid UTF-8", path.display());
                    (ChunkBody::Binary, EntryOutcome::Skipped(SkipReason::Binary))
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                let message = e.to_string();
                (
                    ChunkBody::Error(message.clone()),
                    EntryOutcome::Skipped(SkipReason::Unreadable(message)),
                )
            }
        };

        FileVisit {
            path: path.to_path_buf(),
            body: Some(body),
            outcome,
        }
    }
}

/// Sibling order shared by both passes
pub fn sibling_order(a_name: &str, a_is_dir: bool, b_name: &str, b_is_dir: bool) -> Ordering {
    b_is_dir
        .cmp(&a_is_dir)
        .then_with(|| a_name.to_lowercase().cmp(&b_name.to_lowercase()))
        .then_with(|| a_name.cmp(b_name))
}

/// One level of the structure walk
struct Frame {
    entries: Vec<TreeEntry>,
    next: usize,
    indent: String,
}

/// Iterator over the rendered lines of the structure section
///
/// Lines carry no trailing newline.
pub struct StructureLines<'a> {
    scanner: &'a Scanner,
    stack: Vec<Frame>,
    queued: Option<String>,
    started: bool,
    failures: Vec<(PathBuf, String)>,
}

impl<'a> StructureLines<'a> {
    fn new(scanner: &'a Scanner) -> Self {
        Self {
            scanner,
            stack: Vec::new(),
            queued: None,
            started: false,
            failures: Vec::new(),
        }
    }

    /// Directories that could not be listed, with the reason
    pub fn failures(&self) -> &[(PathBuf, String)] {
        &self.failures
    }

    /// Descend into `dir`, or queue a `<no access>` leaf when it cannot be listed
    fn open(&mut self, dir: &Path, indent: String) {
        match self.scanner.list_children(dir) {
            Ok(entries) => self.stack.push(Frame {
                entries,
                next: 0,
                indent,
            }),
            Err(e) => {
                warn!("Cannot list {}: {}", dir.display(), e);
                self.failures.push((dir.to_path_buf(), e.to_string()));
                self.queued = Some(format!("{}{}{}", indent, CORNER, NO_ACCESS));
            }
        }
    }
}

impl Iterator for StructureLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if !self.started {
            self.started = true;
            let root = self.scanner.root.clone();
            self.open(&root, BLANK_INDENT.to_string());
            return Some(format!("{}{}", CORNER, self.scanner.root_name()));
        }

        if let Some(line) = self.queued.take() {
            return Some(line);
        }

        loop {
            let frame = self.stack.last_mut()?;
            if frame.next >= frame.entries.len() {
                self.stack.pop();
                continue;
            }

            let entry = frame.entries[frame.next].clone();
            frame.next += 1;
            let is_last = frame.next == frame.entries.len();
            let connector = if is_last { CORNER } else { TEE };
            let line = format!("{}{}{}", frame.indent, connector, entry.name);

            if entry.kind == EntryKind::Directory {
                let child_indent = format!(
                    "{}{}",
                    frame.indent,
                    if is_last { BLANK_INDENT } else { PIPE_INDENT }
                );
                self.open(&entry.path, child_indent);
            }

            return Some(line);
        }
    }
}

/// Iterator over the files visited by the content pass
pub struct ContentVisits<'a> {
    scanner: &'a Scanner,
    walker: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + 'a>,
    failures: Vec<(PathBuf, String)>,
}

impl<'a> ContentVisits<'a> {
    fn new(scanner: &'a Scanner) -> Self {
        let walker = WalkDir::new(&scanner.root)
            .follow_links(false)
            .sort_by(|a, b| {
                sibling_order(
                    &a.file_name().to_string_lossy(),
                    is_dir_like(a),
                    &b.file_name().to_string_lossy(),
                    is_dir_like(b),
                )
            })
            .into_iter()
            .filter_entry(move |entry| {
                entry.depth() == 0 || scanner.classify(entry.path(), entry.file_type()).is_some()
            });

        Self {
            scanner,
            walker: Box::new(walker),
            failures: Vec::new(),
        }
    }

    /// Directories or entries the walk could not read, with the reason
    pub fn failures(&self) -> &[(PathBuf, String)] {
        &self.failures
    }
}

impl Iterator for ContentVisits<'_> {
    type Item = FileVisit;

    fn next(&mut self) -> Option<FileVisit> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    if entry.depth() == 0 || is_dir_like(&entry) {
                        continue;
                    }
                    return Some(self.scanner.visit_file(entry.path()));
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    debug!("Content walk error at {}: {}", path.display(), e);
                    self.failures.push((path, e.to_string()));
                }
            }
        }
    }
}

fn is_dir_like(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_sibling_order_puts_directories_first() {
        let mut names = vec![("b", false), ("A", true), ("c", false), ("B", false)];
        names.sort_by(|a, b| sibling_order(a.0, a.1, b.0, b.1));
        let sorted: Vec<_> = names.iter().map(|(name, _)| *name).collect();
        assert_eq!(sorted, vec!["A", "B", "b", "c"]);
    }

    #[test]
    fn test_structure_of_empty_root() -> io::Result<()> {
        let temp_dir = tempdir()?;
        let root = temp_dir.path().join("empty");
        fs::create_dir(&root)?;

        let scanner = Scanner::new(&root, FilterConfig::default())?;
        let lines: Vec<String> = scanner.structure().collect();
        assert_eq!(lines, vec!["└── empty".to_string()]);
        Ok(())
    }

    #[test]
    fn test_classify_excluded_path() -> io::Result<()> {
        let temp_dir = tempdir()?;
        let root = fs::canonicalize(temp_dir.path())?;
        let report = root.join("report.txt");
        File::create(&report)?.write_all(b"old report")?;
        File::create(root.join("keep.txt"))?;

        let scanner =
            Scanner::new(&root, FilterConfig::default())?.with_excluded_path(report.clone());
        let names: Vec<String> = scanner
            .list_children(&root)?
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, vec!["keep.txt".to_string()]);

        let visited: Vec<PathBuf> = scanner.contents().map(|visit| visit.path).collect();
        assert_eq!(visited, vec![root.join("keep.txt")]);
        Ok(())
    }
}
