/*!
 * Named, reusable filter configurations
 */

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::StorageResult;
use super::{ensure_field, load_document, save_document, Document, SCHEMA_VERSION};
use crate::types::FilterConfig;
use crate::utils::{
    ALL_FILES_IGNORED_DIRS, ALL_FILES_IGNORED_FILES, PYTHON_EXTENSIONS, PYTHON_IGNORED_DIRS,
    PYTHON_IGNORED_FILES, WEB_EXTENSIONS, WEB_IGNORED_DIRS, WEB_IGNORED_FILES,
};

const TEMPLATES_FILE: &str = "templates.json";

/// A saved filter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Identifier; random for user templates, fixed for built-ins
    pub id: String,
    /// Display name
    pub name: String,
    /// The filters
    #[serde(default)]
    pub settings: FilterConfig,
    /// Creation time
    pub created_at: NaiveDateTime,
    /// Last modification time
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
struct TemplateDocument {
    version: u64,
    #[serde(default)]
    templates: Vec<Template>,
}

impl Document for TemplateDocument {
    const NAME: &'static str = "templates";

    fn fresh() -> Self {
        Self {
            version: SCHEMA_VERSION,
            templates: default_templates(),
        }
    }

    fn migrate(from_version: u64, document: &mut Map<String, Value>) {
        debug!("Migrating templates from version {}", from_version);
        ensure_field(document, "templates", Value::Array(Vec::new()));

        let now = Value::String(Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.f").to_string());
        if let Some(Value::Array(templates)) = document.get_mut("templates") {
            for template in templates.iter_mut().filter_map(Value::as_object_mut) {
                ensure_field(template, "settings", Value::Object(Map::new()));
                ensure_field(template, "created_at", now.clone());
                let created_at = template["created_at"].clone();
                ensure_field(template, "updated_at", created_at);
            }

            // Version 1 kept the presets out of the file
            let missing: Vec<Value> = default_templates()
                .into_iter()
                .filter(|preset| {
                    !templates
                        .iter()
                        .any(|t| t.get("id").and_then(Value::as_str) == Some(preset.id.as_str()))
                })
                .filter_map(|preset| serde_json::to_value(preset).ok())
                .collect();
            if !missing.is_empty() {
                debug!("Adding {} built-in templates", missing.len());
                templates.splice(0..0, missing);
            }
        }
    }
}

/// The built-in presets seeded into a new store
pub fn default_templates() -> Vec<Template> {
    let now = Local::now().naive_local();
    let preset = |id: &str, name: &str, settings: FilterConfig| Template {
        id: id.to_string(),
        name: name.to_string(),
        settings,
        created_at: now,
        updated_at: now,
    };

    vec![
        preset(
            "default_python",
            "Python project",
            FilterConfig::new(
                PYTHON_IGNORED_DIRS.iter().copied(),
                PYTHON_IGNORED_FILES.iter().copied(),
                PYTHON_EXTENSIONS.iter().copied(),
            ),
        ),
        preset(
            "default_web",
            "Web project (HTML/CSS/JS)",
            FilterConfig::new(
                WEB_IGNORED_DIRS.iter().copied(),
                WEB_IGNORED_FILES.iter().copied(),
                WEB_EXTENSIONS.iter().copied(),
            ),
        ),
        preset(
            "default_all",
            "All files",
            FilterConfig::new(
                ALL_FILES_IGNORED_DIRS.iter().copied(),
                ALL_FILES_IGNORED_FILES.iter().copied(),
                std::iter::empty::<&str>(),
            ),
        ),
    ]
}

/// Store of templates backed by `<storage_dir>/templates.json`
#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates_file: PathBuf,
}

impl TemplateStore {
    /// Open the store; a new store is seeded with [`default_templates`]
    pub fn open(storage_dir: impl AsRef<Path>) -> StorageResult<Self> {
        let store = Self {
            templates_file: storage_dir.as_ref().join(TEMPLATES_FILE),
        };
        store.read()?;
        Ok(store)
    }

    /// Every template, in creation order
    pub fn get_all(&self) -> StorageResult<Vec<Template>> {
        Ok(self.read()?.templates)
    }

    /// One template by id
    pub fn get(&self, id: &str) -> StorageResult<Option<Template>> {
        Ok(self.get_all()?.into_iter().find(|template| template.id == id))
    }

    /// Save a new template
    pub fn create(&self, name: &str, settings: FilterConfig) -> StorageResult<Template> {
        let mut document = self.read()?;
        let now = Local::now().naive_local();
        let template = Template {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            settings,
            created_at: now,
            updated_at: now,
        };

        document.templates.push(template.clone());
        save_document(&self.templates_file, &document)?;
        info!("Created template {} ({})", template.name, template.id);
        Ok(template)
    }

    /// Rename a template and/or replace its filters
    ///
    /// Returns `None` for an unknown id.
    pub fn update(
        &self,
        id: &str,
        name: Option<&str>,
        settings: Option<FilterConfig>,
    ) -> StorageResult<Option<Template>> {
        let mut document = self.read()?;
        let Some(template) = document.templates.iter_mut().find(|template| template.id == id)
        else {
            return Ok(None);
        };

        if let Some(name) = name {
            template.name = name.to_string();
        }
        if let Some(settings) = settings {
            template.settings = settings;
        }
        template.updated_at = Local::now().naive_local();

        let updated = template.clone();
        save_document(&self.templates_file, &document)?;
        Ok(Some(updated))
    }

    /// Delete a template; `false` when the id is unknown
    pub fn delete(&self, id: &str) -> StorageResult<bool> {
        let mut document = self.read()?;
        let before = document.templates.len();
        document.templates.retain(|template| template.id != id);

        if document.templates.len() == before {
            return Ok(false);
        }

        save_document(&self.templates_file, &document)?;
        info!("Deleted template {}", id);
        Ok(true)
    }

    fn read(&self) -> StorageResult<TemplateDocument> {
        load_document(&self.templates_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_new_store_is_seeded_with_defaults() -> StorageResult<()> {
        let temp_dir = tempdir()?;
        let store = TemplateStore::open(temp_dir.path())?;

        let ids: Vec<String> = store.get_all()?.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["default_python", "default_web", "default_all"]);

        let python = store.get("default_python")?.expect("preset should exist");
        assert!(python.settings.allowed_extensions.contains(".py"));
        assert!(python.settings.ignored_dirs.contains("__pycache__"));

        let all = store.get("default_all")?.expect("preset should exist");
        assert!(all.settings.allowed_extensions.is_empty());
        Ok(())
    }

    #[test]
    fn test_create_then_get_round_trips_settings() -> StorageResult<()> {
        let temp_dir = tempdir()?;
        let store = TemplateStore::open(temp_dir.path())?;
        let settings = FilterConfig::new(["target", ".git"], ["Cargo.lock"], [".rs", ".TOML"]);

        let created = store.create("Rust crate", settings.clone())?;
        let fetched = store.get(&created.id)?.expect("template should exist");

        assert_eq!(fetched.settings, settings);
        assert_eq!(fetched.name, "Rust crate");
        assert_eq!(fetched, created);
        Ok(())
    }

    #[test]
    fn test_update_and_delete() -> StorageResult<()> {
        let temp_dir = tempdir()?;
        let store = TemplateStore::open(temp_dir.path())?;
        let created = store.create("Draft", FilterConfig::default())?;

        let renamed = store
            .update(&created.id, Some("Final"), None)?
            .expect("template should exist");
        assert_eq!(renamed.name, "Final");
        assert_eq!(renamed.settings, FilterConfig::default());
        assert!(renamed.updated_at >= created.updated_at);

        let narrowed = FilterConfig::new([""; 0], [""; 0], [".md"]);
        let updated = store
            .update(&created.id, None, Some(narrowed.clone()))?
            .expect("template should exist");
        assert_eq!(updated.name, "Final");
        assert_eq!(updated.settings, narrowed);

        assert!(store.update("unknown", Some("x"), None)?.is_none());
        assert!(store.delete(&created.id)?);
        assert!(!store.delete(&created.id)?);
        assert!(store.get(&created.id)?.is_none());
        Ok(())
    }

    #[test]
    fn test_corrupted_document_is_reseeded() -> StorageResult<()> {
        let temp_dir = tempdir()?;
        let store = TemplateStore::open(temp_dir.path())?;
        store.create("Mine", FilterConfig::default())?;
        fs::write(temp_dir.path().join("templates.json"), "\u{0}garbage")?;

        let templates = store.get_all()?;
        assert_eq!(templates.len(), 3);
        assert!(templates.iter().all(|t| t.id.starts_with("default_")));
        Ok(())
    }

    #[test]
    fn test_version_one_without_presets_gains_them() -> StorageResult<()> {
        let temp_dir = tempdir()?;
        fs::write(
            temp_dir.path().join("templates.json"),
            r#"{"version": 1, "templates": []}"#,
        )?;

        let store = TemplateStore::open(temp_dir.path())?;
        let ids: Vec<String> = store.get_all()?.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["default_python", "default_web", "default_all"]);
        assert!(store.get("default_python")?.is_some());

        let raw: Value =
            serde_json::from_str(&fs::read_to_string(temp_dir.path().join("templates.json"))?)?;
        assert_eq!(raw["version"], SCHEMA_VERSION);
        assert_eq!(raw["templates"].as_array().map(Vec::len), Some(3));
        Ok(())
    }

    #[test]
    fn test_legacy_document_is_migrated() -> StorageResult<()> {
        let temp_dir = tempdir()?;
        let legacy = r#"{
  "version": 1,
  "templates": [
    {
      "id": "0d6f3f5e-8a41-4a53-9b7e-1f1c8c1d2a00",
      "name": "Docs",
      "settings": {"ignored_dirs": [], "ignored_files": [], "allowed_extensions": [".md"]},
      "created_at": "2024-05-01T09:30:00.123456",
      "updated_at": "2024-05-02T09:30:00.654321"
    },
    {
      "id": "no-stamps",
      "name": "Hand edited"
    }
  ]
}"#;
        fs::write(temp_dir.path().join("templates.json"), legacy)?;

        let store = TemplateStore::open(temp_dir.path())?;
        let templates = store.get_all()?;
        // Presets first, then the stored templates in their order
        assert_eq!(templates.len(), 5);
        assert_eq!(templates[0].id, "default_python");
        assert_eq!(templates[3].name, "Docs");
        assert!(templates[3].settings.allowed_extensions.contains(".md"));
        assert_eq!(templates[4].created_at, templates[4].updated_at);
        assert_eq!(templates[4].settings, FilterConfig::default());
        Ok(())
    }
}
