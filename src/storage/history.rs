/*!
 * History of analyzer runs
 *
 * Every run is recorded with the root it scanned, the report it produced
 * and the filters it used, so reports can be found, reopened or deleted
 * later.
 */

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{StorageError, StorageResult};
use super::{ensure_field, load_document, save_document, Document, SCHEMA_VERSION};
use crate::report::ScanReport;
use crate::types::FilterConfig;

const HISTORY_FILE: &str = "history.json";
const OUTPUTS_DIR: &str = "outputs";

/// One past analyzer run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Short random identifier
    pub id: String,
    /// Root directory that was analyzed
    pub project_path: PathBuf,
    /// Report file the run produced
    pub output_file: PathBuf,
    /// Local time of the run
    pub created_at: NaiveDateTime,
    /// Filters used for the run
    #[serde(default)]
    pub settings: FilterConfig,
    /// User-chosen display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Number of lines in the report when it was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_count: Option<usize>,
}

impl HistoryRecord {
    /// Display name, falling back to the project path
    pub fn title(&self) -> String {
        self.display_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.project_path.display().to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryDocument {
    version: u64,
    #[serde(default)]
    items: Vec<HistoryRecord>,
}

impl Document for HistoryDocument {
    const NAME: &'static str = "history";

    fn fresh() -> Self {
        Self {
            version: SCHEMA_VERSION,
            items: Vec::new(),
        }
    }

    fn migrate(from_version: u64, document: &mut Map<String, Value>) {
        debug!("Migrating history from version {}", from_version);
        ensure_field(document, "items", Value::Array(Vec::new()));

        if let Some(Value::Array(items)) = document.get_mut("items") {
            for item in items.iter_mut().filter_map(Value::as_object_mut) {
                ensure_field(item, "settings", Value::Object(Map::new()));
                // Early records used `path` for the project root
                if let Some(path) = item.remove("path") {
                    ensure_field(item, "project_path", path);
                }
            }
        }
    }
}

/// Store of past runs backed by `<base_dir>/history.json`
#[derive(Debug, Clone)]
pub struct HistoryStore {
    base_dir: PathBuf,
    outputs_dir: PathBuf,
    history_file: PathBuf,
}

impl HistoryStore {
    /// Open the store, creating the directory layout and an empty document
    pub fn open(base_dir: impl AsRef<Path>) -> StorageResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let outputs_dir = base_dir.join(OUTPUTS_DIR);
        fs::create_dir_all(&outputs_dir)?;

        let store = Self {
            history_file: base_dir.join(HISTORY_FILE),
            base_dir,
            outputs_dir,
        };
        // Creates or repairs the document up front
        store.read()?;
        Ok(store)
    }

    /// Directory holding the store
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory where reports are written by default
    pub fn outputs_dir(&self) -> &Path {
        &self.outputs_dir
    }

    /// Fresh report path for a project: `outputs/<name>_<timestamp>.txt`
    pub fn default_output_path(&self, project_path: &Path) -> PathBuf {
        let name = project_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string());
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        self.outputs_dir.join(format!("{}_{}.txt", name, stamp))
    }

    /// All records, oldest first
    pub fn load(&self) -> StorageResult<Vec<HistoryRecord>> {
        Ok(self.read()?.items)
    }

    /// All records, oldest first
    pub fn get_all(&self) -> StorageResult<Vec<HistoryRecord>> {
        self.load()
    }

    /// One record by id
    pub fn get(&self, id: &str) -> StorageResult<Option<HistoryRecord>> {
        Ok(self.load()?.into_iter().find(|record| record.id == id))
    }

    /// Append a record for a run
    pub fn add(
        &self,
        project_path: &Path,
        output_file: &Path,
        settings: FilterConfig,
    ) -> StorageResult<HistoryRecord> {
        self.append(HistoryRecord {
            id: new_id(),
            project_path: project_path.to_path_buf(),
            output_file: output_file.to_path_buf(),
            created_at: now_to_seconds(),
            settings,
            display_name: None,
            description: None,
            line_count: None,
        })
    }

    /// Append a record for a finished run, keeping its report line count
    pub fn add_run(&self, report: &ScanReport, settings: FilterConfig) -> StorageResult<HistoryRecord> {
        self.append(HistoryRecord {
            id: new_id(),
            project_path: report.root.clone(),
            output_file: report.output_file.clone(),
            created_at: now_to_seconds(),
            settings,
            display_name: None,
            description: None,
            line_count: Some(report.report_lines),
        })
    }

    /// Change the display name and description of a record
    ///
    /// `None` leaves a field unchanged; an empty description clears it.
    /// A blank display name is rejected.
    pub fn update(
        &self,
        id: &str,
        display_name: Option<String>,
        description: Option<String>,
    ) -> StorageResult<Option<HistoryRecord>> {
        if display_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(StorageError::InvalidValue("display name cannot be empty".into()));
        }

        let mut document = self.read()?;
        let Some(record) = document.items.iter_mut().find(|record| record.id == id) else {
            return Ok(None);
        };

        if let Some(name) = display_name {
            record.display_name = Some(name);
        }
        if let Some(text) = description {
            record.description = Some(text).filter(|text| !text.is_empty());
        }

        let updated = record.clone();
        save_document(&self.history_file, &document)?;
        Ok(Some(updated))
    }

    /// Remove a record, optionally deleting its report file
    ///
    /// Returns `false` for an unknown id. A report that is already gone, or
    /// that cannot be deleted, does not fail the removal.
    pub fn remove(&self, id: &str, delete_output: bool) -> StorageResult<bool> {
        let mut document = self.read()?;
        let Some(index) = document.items.iter().position(|record| record.id == id) else {
            return Ok(false);
        };

        let record = document.items.remove(index);
        if delete_output {
            match fs::remove_file(&record.output_file) {
                Ok(()) => info!("Deleted report {}", record.output_file.display()),
                Err(e) => debug!(
                    "Could not delete report {}: {}",
                    record.output_file.display(),
                    e
                ),
            }
        }

        save_document(&self.history_file, &document)?;
        Ok(true)
    }

    fn append(&self, record: HistoryRecord) -> StorageResult<HistoryRecord> {
        let mut document = self.read()?;
        document.items.push(record.clone());
        save_document(&self.history_file, &document)?;
        info!("Recorded run {} for {}", record.id, record.project_path.display());
        Ok(record)
    }

    fn read(&self) -> StorageResult<HistoryDocument> {
        load_document(&self.history_file)
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn now_to_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
