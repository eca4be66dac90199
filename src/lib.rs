/*!
 * projdump - Dump a project's structure and text into a single report
 *
 * This library renders a directory tree followed by the contents of the
 * project's text files into one plain-text report, and keeps a history of
 * generated reports and a set of reusable filter templates.
 */

pub mod analyzer;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod launcher;
pub mod report;
pub mod scanner;
pub mod storage;
pub mod types;
pub mod utils;
pub mod writer;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use analyzer::ProjectAnalyzer;
pub use config::Config;
pub use error::{ProjDumpError, Result};
pub use report::{ReportFormat, Reporter, ScanReport};
pub use scanner::Scanner;
pub use storage::{HistoryRecord, HistoryStore, Template, TemplateStore};
pub use types::{EntryOutcome, FilterConfig, SkipReason};
pub use utils::{count_lines, format_file_size};
pub use writer::TextWriter;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
