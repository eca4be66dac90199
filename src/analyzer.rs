/*!
 * The project analyzer: one root, one filter, one report file
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use indicatif::ProgressBar;
use tracing::info;

use crate::ensure;
use crate::error::Result;
use crate::report::ScanReport;
use crate::scanner::Scanner;
use crate::types::FilterConfig;
use crate::writer::TextWriter;

/// Renders a project's structure and file contents into a report file
#[derive(Clone, Debug)]
pub struct ProjectAnalyzer {
    root: PathBuf,
    output_file: PathBuf,
    filters: FilterConfig,
    progress: Arc<ProgressBar>,
}

impl ProjectAnalyzer {
    /// Create an analyzer for `root`
    ///
    /// Fails with a configuration error when `root` does not exist or is not
    /// a directory. Nothing is written until [`run`](Self::run).
    pub fn new(
        root: impl AsRef<Path>,
        output_file: impl Into<PathBuf>,
        filters: FilterConfig,
    ) -> Result<Self> {
        let root = root.as_ref();
        ensure!(
            root.is_dir(),
            Config,
            "Root directory does not exist or is not a directory: {}",
            root.display()
        );

        Ok(Self {
            root: fs::canonicalize(root)?,
            output_file: output_file.into(),
            filters,
            progress: Arc::new(ProgressBar::hidden()),
        })
    }

    /// Report per-file progress on `progress`
    pub fn with_progress(mut self, progress: Arc<ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    /// Canonical root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Report path as configured
    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Filters in effect
    pub fn filters(&self) -> &FilterConfig {
        &self.filters
    }

    /// Write the report, overwriting any existing file
    pub fn run(&self) -> Result<ScanReport> {
        let start_time = Instant::now();
        let output_file = self.prepare_output()?;

        info!(
            "Analyzing {} into {}",
            self.root.display(),
            output_file.display()
        );

        let scanner = Scanner::new(&self.root, self.filters.clone())?
            .with_excluded_path(output_file.clone())
            .with_progress(Arc::clone(&self.progress));

        let mut report = TextWriter::new(&scanner).write_file(&output_file)?;
        report.duration = start_time.elapsed();

        info!(
            "Wrote {} lines ({} files included, {} skipped) to {}",
            report.report_lines,
            report.files_included,
            report.files_skipped,
            output_file.display()
        );
        Ok(report)
    }

    /// Create parent directories and resolve the report path to an absolute one
    fn prepare_output(&self) -> Result<PathBuf> {
        let parent = match self.output_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let file_name = self.output_file.file_name().ok_or_else(|| {
            crate::error!(
                InvalidArgument,
                "Output path has no file name: {}",
                self.output_file.display()
            )
        })?;

        Ok(fs::canonicalize(&parent)?.join(file_name))
    }
}
