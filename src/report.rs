/*!
 * Run summaries for projdump
 *
 * Every file visited by the content pass leaves an [`EntryOutcome`]; this
 * module accumulates them into a [`ScanReport`] and renders it as console
 * tables using the tabled library.
 */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::types::{EntryOutcome, SkipReason};

/// Summary of one analyzer run
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Canonical root that was scanned
    pub root: PathBuf,
    /// Report file path
    pub output_file: PathBuf,
    /// Time taken to scan and write
    pub duration: Duration,
    /// Number of files whose content was written
    pub files_included: usize,
    /// Number of files that contributed no content
    pub files_skipped: usize,
    /// Total number of lines of included content
    pub total_lines: usize,
    /// Total number of characters of included content
    pub total_chars: usize,
    /// Number of lines in the written report
    pub report_lines: usize,
    /// Outcome of each visited file, in report order
    pub file_details: Vec<(PathBuf, EntryOutcome)>,
    /// Directories that could not be listed
    pub unreadable_dirs: Vec<(PathBuf, String)>,
}

impl ScanReport {
    /// Create an empty report
    pub fn new(root: &Path, output_file: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            output_file: output_file.to_path_buf(),
            duration: Duration::ZERO,
            files_included: 0,
            files_skipped: 0,
            total_lines: 0,
            total_chars: 0,
            report_lines: 0,
            file_details: Vec::new(),
            unreadable_dirs: Vec::new(),
        }
    }

    /// Record the outcome of one file
    pub fn record(&mut self, path: PathBuf, outcome: EntryOutcome) {
        match &outcome {
            EntryOutcome::Included { lines, chars } => {
                self.files_included += 1;
                self.total_lines += lines;
                self.total_chars += chars;
            }
            EntryOutcome::Skipped(_) => self.files_skipped += 1,
        }
        self.file_details.push((path, outcome));
    }

    /// Record a directory the structure pass could not list
    pub fn record_unreadable_dir(&mut self, path: &Path, reason: &str) {
        self.unreadable_dirs
            .push((path.to_path_buf(), reason.to_string()));
    }

    /// Skipped files grouped by reason label
    pub fn skipped_by_reason(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for (_, outcome) in &self.file_details {
            if let EntryOutcome::Skipped(reason) = outcome {
                *counts.entry(reason.as_ref().to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Files that were dumped with an inline error or placeholder
    pub fn problems(&self) -> impl Iterator<Item = (&Path, &SkipReason)> {
        self.file_details.iter().filter_map(|(path, outcome)| match outcome {
            EntryOutcome::Skipped(reason @ (SkipReason::Binary | SkipReason::Unreadable(_))) => {
                Some((path.as_path(), reason))
            }
            _ => None,
        })
    }
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for scan results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Format a number with human-readable units
    fn format_number(&self, num: usize) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    /// Generate a report string based on scan statistics
    pub fn generate_report(&self, report: &ScanReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &ScanReport) {
        println!("\n{}", self.generate_report(report));
    }

    /// Path relative to the scanned root where possible
    fn format_path(&self, root: &Path, path: &Path, max_len: usize) -> String {
        let rel_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .display()
            .to_string();

        let char_count = rel_path.chars().count();
        if char_count <= max_len {
            return rel_path;
        }

        let tail: String = rel_path
            .chars()
            .skip(char_count - max_len.saturating_sub(3))
            .collect();
        format!("...{}", tail)
    }

    fn create_summary_table(&self, report: &ScanReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let mut rows = vec![
            SummaryRow {
                key: "Project".to_string(),
                value: report.root.display().to_string(),
            },
            SummaryRow {
                key: "Output File".to_string(),
                value: report.output_file.display().to_string(),
            },
            SummaryRow {
                key: "Process Time".to_string(),
                value: format!("{:.4?}", report.duration),
            },
            SummaryRow {
                key: "Files Included".to_string(),
                value: self.format_number(report.files_included),
            },
            SummaryRow {
                key: "Total Lines".to_string(),
                value: self.format_number(report.total_lines),
            },
            SummaryRow {
                key: "Report Lines".to_string(),
                value: self.format_number(report.report_lines),
            },
        ];

        for (reason, count) in report.skipped_by_reason() {
            rows.push(SummaryRow {
                key: format!("Skipped ({})", reason.replace('_', " ")),
                value: self.format_number(count),
            });
        }

        if !report.unreadable_dirs.is_empty() {
            rows.push(SummaryRow {
                key: "Unreadable Dirs".to_string(),
                value: self.format_number(report.unreadable_dirs.len()),
            });
        }

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn create_problems_table(&self, report: &ScanReport) -> Option<String> {
        #[derive(Tabled)]
        struct ProblemRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Problem")]
            reason: String,
        }

        let rows: Vec<ProblemRow> = report
            .problems()
            .map(|(path, reason)| ProblemRow {
                path: self.format_path(&report.root, path, 60),
                reason: reason.to_string(),
            })
            .chain(report.unreadable_dirs.iter().map(|(path, reason)| ProblemRow {
                path: format!("{}/", self.format_path(&report.root, path, 59)),
                reason: format!("unreadable: {}", reason),
            }))
            .collect();

        if rows.is_empty() {
            return None;
        }

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        Some(table.to_string())
    }

    fn generate_console_report(&self, report: &ScanReport) -> String {
        let summary = format!("ANALYSIS COMPLETE\n{}", self.create_summary_table(report));

        match self.create_problems_table(report) {
            Some(problems) => format!("FILES WITH PROBLEMS\n{}\n\n{}", problems, summary),
            None => summary,
        }
    }
}
