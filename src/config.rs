/*!
 * Configuration handling for projdump
 */

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::ensure;
use crate::error::Result;
use crate::storage::{default_storage_dir, HistoryStore, Template, STORAGE_DIR_ENV};
use crate::types::FilterConfig;
use crate::utils::split_names;

/// Command-line arguments for projdump
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "projdump",
    version = env!("CARGO_PKG_VERSION"),
    about = "Dump a project's directory tree and text files into one report",
    long_about = "Writes a single text report holding the directory tree of a project followed by the contents of its text files, keeps a history of generated reports and stores reusable filter templates."
)]
pub struct Cli {
    /// Directory holding history, templates and generated reports
    #[clap(long, global = true, env = STORAGE_DIR_ENV, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Storage directory from the flag, the environment or the platform default
    pub fn storage_dir(&self) -> Result<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(default_storage_dir()?),
        }
    }

    /// Log filter selected by `-v` when `RUST_LOG` is not set
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze a project and write its report
    Run(RunArgs),

    /// Browse and manage past runs
    #[clap(subcommand)]
    History(HistoryCommand),

    /// Manage filter templates
    #[clap(subcommand)]
    Template(TemplateCommand),

    /// Generate shell completions
    Completions {
        #[clap(value_enum)]
        shell: Shell,
    },
}

/// Filter flags shared by `run` and the template commands
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Comma-separated directory names (or globs) to skip entirely
    #[clap(long, value_delimiter = ',', value_name = "NAMES")]
    pub ignore_dirs: Vec<String>,

    /// Comma-separated file names (or globs) to skip entirely
    #[clap(long, value_delimiter = ',', value_name = "NAMES")]
    pub ignore_files: Vec<String>,

    /// Comma-separated extensions whose contents are dumped (all when empty)
    #[clap(long, value_delimiter = ',', value_name = "EXTS")]
    pub extensions: Vec<String>,

    /// Dump every file, dropping the extension allow-list
    #[clap(long, conflicts_with = "extensions")]
    pub all_extensions: bool,
}

impl FilterArgs {
    /// Whether any filter flag was given
    pub fn is_empty(&self) -> bool {
        self.ignore_dirs.is_empty()
            && self.ignore_files.is_empty()
            && self.extensions.is_empty()
            && !self.all_extensions
    }

    /// Apply the given flags on top of `base`; each given flag replaces its field
    pub fn apply_to(&self, base: FilterConfig) -> FilterConfig {
        let names = |values: &[String]| -> Vec<String> {
            values.iter().flat_map(|value| split_names(value)).collect()
        };
        let given = FilterConfig::new(
            names(&self.ignore_dirs),
            names(&self.ignore_files),
            names(&self.extensions),
        );

        FilterConfig {
            ignored_dirs: pick(given.ignored_dirs, base.ignored_dirs),
            ignored_files: pick(given.ignored_files, base.ignored_files),
            allowed_extensions: if self.all_extensions {
                BTreeSet::new()
            } else {
                pick(given.allowed_extensions, base.allowed_extensions)
            },
        }
    }
}

fn pick(given: BTreeSet<String>, base: BTreeSet<String>) -> BTreeSet<String> {
    if given.is_empty() {
        base
    } else {
        given
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Root directory of the project
    pub root: PathBuf,

    /// Report file (defaults to a timestamped file in the storage outputs folder)
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[clap(flatten)]
    pub filters: FilterArgs,

    /// Start from a saved template; filter flags override its fields
    #[clap(long, value_name = "ID")]
    pub template: Option<String>,

    /// Do not record the run in history
    #[clap(long)]
    pub no_history: bool,

    /// Copy the report to the system clipboard
    #[clap(long, help = "Copy the report to the system clipboard")]
    pub clip: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List past runs, newest first
    List,
    /// Show one run in detail
    Show { id: String },
    /// Set the display name and description of a run
    Rename {
        id: String,
        name: String,
        #[clap(long)]
        description: Option<String>,
    },
    /// Remove a run, deleting its report unless --keep-output
    Remove {
        id: String,
        #[clap(long)]
        keep_output: bool,
    },
    /// Open the report of a run
    Open { id: String },
    /// Open the folder containing the report of a run
    Reveal { id: String },
    /// Copy the report of a run, its path, or the file itself to the clipboard
    Copy {
        id: String,
        /// Copy the report path as text
        #[clap(long, conflicts_with = "file")]
        path: bool,
        /// Copy the report as a file object that file managers can paste
        #[clap(long)]
        file: bool,
        /// Copy even when the report exceeds the clipboard size limit
        #[clap(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TemplateCommand {
    /// List templates
    List,
    /// Show one template
    Show { id: String },
    /// Save a new template
    Create {
        name: String,
        #[clap(flatten)]
        filters: FilterArgs,
    },
    /// Rename a template or replace some of its filters
    Update {
        id: String,
        #[clap(long)]
        name: Option<String>,
        #[clap(flatten)]
        filters: FilterArgs,
    },
    /// Delete a template
    Delete { id: String },
}

/// Configuration of a single analyzer run
#[derive(Clone, Debug)]
pub struct Config {
    /// Root directory to analyze
    pub root: PathBuf,

    /// Report file to write
    pub output_file: PathBuf,

    /// Filters for both passes
    pub filters: FilterConfig,

    /// Record the run in history
    pub record_history: bool,

    /// Copy the report to the clipboard
    pub clip: bool,
}

impl Config {
    /// Build a run configuration from `run` arguments and an optional template
    pub fn from_run_args(args: &RunArgs, template: Option<&Template>, history: &HistoryStore) -> Self {
        let base = template
            .map(|template| template.settings.clone())
            .unwrap_or_default();

        Self {
            root: args.root.clone(),
            output_file: args
                .output
                .clone()
                .unwrap_or_else(|| history.default_output_path(&absolute_root(&args.root))),
            filters: args.filters.apply_to(base),
            record_history: !args.no_history,
            clip: args.clip,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.root.is_dir(),
            Config,
            "Root directory does not exist or is not a directory: {}",
            self.root.display()
        );
        ensure!(
            !self.output_file.is_dir(),
            Config,
            "Output path is a directory: {}",
            self.output_file.display()
        );
        Ok(())
    }
}

/// Root as an absolute path so `.` still yields a useful report name
fn absolute_root(root: &Path) -> PathBuf {
    std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}
