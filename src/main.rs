/*!
 * Command-line interface for projdump
 */

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tabled::{settings::Style, Table, Tabled};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use projdump::analyzer::ProjectAnalyzer;
use projdump::clipboard;
use projdump::config::{Cli, Command, Config, HistoryCommand, RunArgs, TemplateCommand};
use projdump::ensure;
use projdump::error::{ProjDumpError, Result};
use projdump::launcher;
use projdump::report::{ReportFormat, Reporter};
use projdump::storage::{HistoryRecord, HistoryStore, Template, TemplateStore};
use projdump::types::FilterConfig;
use projdump::utils::{count_lines, format_file_size};

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    if let Command::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "projdump", &mut io::stdout());
        return Ok(());
    }

    let storage_dir = cli.storage_dir()?;
    let history = HistoryStore::open(&storage_dir)?;
    let templates = TemplateStore::open(&storage_dir)?;

    match cli.command {
        Command::Run(args) => run_analysis(&args, &history, &templates),
        Command::History(command) => history_command(command, &history),
        Command::Template(command) => template_command(command, &templates),
        Command::Completions { .. } => Ok(()),
    }
}

//--------------------------------------------------------------------
// run
//--------------------------------------------------------------------

fn run_analysis(args: &RunArgs, history: &HistoryStore, templates: &TemplateStore) -> Result<()> {
    let template = match &args.template {
        Some(id) => Some(
            templates
                .get(id)?
                .ok_or_else(|| ProjDumpError::NotFound(format!("template {}", id)))?,
        ),
        None => None,
    };

    let config = Config::from_run_args(args, template.as_ref(), history);
    config.validate()?;

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} {prefix:.bold.cyan} {pos} files {wide_msg:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress.set_prefix("Analyzing");
    progress.set_message(config.root.display().to_string());

    let analyzer = ProjectAnalyzer::new(&config.root, config.output_file.clone(), config.filters.clone())?
        .with_progress(Arc::new(progress.clone()));
    let result = analyzer.run();
    progress.finish_and_clear();
    let report = result?;

    Reporter::new(ReportFormat::ConsoleTable).print_report(&report);

    if config.record_history {
        let record = history.add_run(&report, config.filters.clone())?;
        println!("Recorded in history as {}", record.id);
    }

    if config.clip {
        match clipboard::copy_file_contents(&report.output_file, false) {
            Ok(()) => println!("📋 Report copied to clipboard"),
            Err(e) => warn!("Failed to copy report to clipboard: {}", e),
        }
    }

    Ok(())
}

//--------------------------------------------------------------------
// history
//--------------------------------------------------------------------

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Created")]
    created_at: String,
    #[tabled(rename = "Name")]
    title: String,
    #[tabled(rename = "Report")]
    output_file: String,
}

impl From<&HistoryRecord> for HistoryRow {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            id: record.id.clone(),
            created_at: record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            title: record.title(),
            output_file: record.output_file.display().to_string(),
        }
    }
}

fn find_record(history: &HistoryStore, id: &str) -> Result<HistoryRecord> {
    history
        .get(id)?
        .ok_or_else(|| ProjDumpError::NotFound(format!("history record {}", id)))
}

fn history_command(command: HistoryCommand, history: &HistoryStore) -> Result<()> {
    match command {
        HistoryCommand::List => {
            let records = history.get_all()?;
            if records.is_empty() {
                println!("No runs recorded yet");
                return Ok(());
            }
            let rows: Vec<HistoryRow> = records.iter().rev().map(HistoryRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        HistoryCommand::Show { id } => {
            let record = find_record(history, &id)?;
            print_record(&record);
        }
        HistoryCommand::Rename {
            id,
            name,
            description,
        } => {
            ensure!(!name.trim().is_empty(), InvalidArgument, "Name cannot be empty");
            let record = history
                .update(&id, Some(name), description)?
                .ok_or_else(|| ProjDumpError::NotFound(format!("history record {}", id)))?;
            println!("Renamed {} to {}", record.id, record.title());
        }
        HistoryCommand::Remove { id, keep_output } => {
            if !history.remove(&id, !keep_output)? {
                return Err(ProjDumpError::NotFound(format!("history record {}", id)));
            }
            println!("Removed {}", id);
        }
        HistoryCommand::Open { id } => {
            let record = find_record(history, &id)?;
            launcher::open_path(&record.output_file)?;
        }
        HistoryCommand::Reveal { id } => {
            let record = find_record(history, &id)?;
            launcher::reveal_path(&record.output_file)?;
        }
        HistoryCommand::Copy {
            id,
            path,
            file,
            force,
        } => {
            let record = find_record(history, &id)?;
            if path {
                clipboard::copy_path(&record.output_file)?;
                println!("📋 Report path copied to clipboard");
            } else if file {
                clipboard::copy_file_as_uri(&record.output_file)?;
                println!("📋 Report file copied to clipboard");
            } else {
                clipboard::copy_file_contents(&record.output_file, force)?;
                println!("📋 Report copied to clipboard");
            }
        }
    }
    Ok(())
}

fn print_record(record: &HistoryRecord) {
    println!("ID:          {}", record.id);
    println!("Name:        {}", record.title());
    if let Some(description) = &record.description {
        println!("Description: {}", description);
    }
    println!("Project:     {}", record.project_path.display());
    println!("Created:     {}", record.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Report:      {}", record.output_file.display());

    match std::fs::metadata(&record.output_file) {
        Ok(metadata) => {
            println!("Size:        {}", format_file_size(metadata.len()));
            match count_lines(&record.output_file) {
                Ok(lines) => println!("Lines:       {}", lines),
                Err(e) => warn!("Could not count lines of {}: {}", record.output_file.display(), e),
            }
        }
        Err(_) => println!("Size:        (report file missing)"),
    }
    print_filters(&record.settings);
}

//--------------------------------------------------------------------
// template
//--------------------------------------------------------------------

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Extensions")]
    extensions: String,
    #[tabled(rename = "Updated")]
    updated_at: String,
}

impl From<&Template> for TemplateRow {
    fn from(template: &Template) -> Self {
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            extensions: join_or(&template.settings.allowed_extensions, "(all)"),
            updated_at: template.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn template_command(command: TemplateCommand, templates: &TemplateStore) -> Result<()> {
    match command {
        TemplateCommand::List => {
            let rows: Vec<TemplateRow> = templates.get_all()?.iter().map(TemplateRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        TemplateCommand::Show { id } => {
            let template = templates
                .get(&id)?
                .ok_or_else(|| ProjDumpError::NotFound(format!("template {}", id)))?;
            println!("ID:          {}", template.id);
            println!("Name:        {}", template.name);
            println!("Created:     {}", template.created_at.format("%Y-%m-%d %H:%M:%S"));
            println!("Updated:     {}", template.updated_at.format("%Y-%m-%d %H:%M:%S"));
            print_filters(&template.settings);
        }
        TemplateCommand::Create { name, filters } => {
            let template = templates.create(&name, filters.apply_to(FilterConfig::default()))?;
            println!("Created template {} ({})", template.name, template.id);
        }
        TemplateCommand::Update { id, name, filters } => {
            let existing = templates
                .get(&id)?
                .ok_or_else(|| ProjDumpError::NotFound(format!("template {}", id)))?;
            let settings = (!filters.is_empty()).then(|| filters.apply_to(existing.settings));

            if name.is_none() && settings.is_none() {
                info!("Nothing to update for template {}", id);
                return Ok(());
            }

            let template = templates
                .update(&id, name.as_deref(), settings)?
                .ok_or_else(|| ProjDumpError::NotFound(format!("template {}", id)))?;
            println!("Updated template {} ({})", template.name, template.id);
        }
        TemplateCommand::Delete { id } => {
            if !templates.delete(&id)? {
                return Err(ProjDumpError::NotFound(format!("template {}", id)));
            }
            println!("Deleted template {}", id);
        }
    }
    Ok(())
}

fn print_filters(settings: &FilterConfig) {
    println!("Ignored dirs:  {}", join_or(&settings.ignored_dirs, "(none)"));
    println!("Ignored files: {}", join_or(&settings.ignored_files, "(none)"));
    println!("Extensions:    {}", join_or(&settings.allowed_extensions, "(all)"));
}

fn join_or(names: &std::collections::BTreeSet<String>, empty: &str) -> String {
    if names.is_empty() {
        empty.to_string()
    } else {
        names.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}
