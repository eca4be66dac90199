/*!
 * Persistent stores for run history and filter templates
 *
 * Each store is one pretty-printed JSON document rewritten whole on every
 * change. Documents carry a schema version; older versions are migrated on
 * read and written back, and documents that fail to decode are replaced by
 * a fresh one instead of failing the store.
 */

pub mod error;
pub mod history;
pub mod templates;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

pub use error::{StorageError, StorageResult};
pub use history::{HistoryRecord, HistoryStore};
pub use templates::{Template, TemplateStore};

/// Current schema version of both documents
pub const SCHEMA_VERSION: u64 = 2;

/// Environment variable overriding the storage directory
pub const STORAGE_DIR_ENV: &str = "PROJDUMP_STORAGE_DIR";

/// Default storage directory: `<data dir>/projdump`
pub fn default_storage_dir() -> StorageResult<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("projdump"))
        .ok_or_else(|| StorageError::NoStorageDir("could not determine data directory".into()))
}

/// A versioned JSON document backing a store
pub(crate) trait Document: Serialize + DeserializeOwned {
    /// Human-readable name used in log messages
    const NAME: &'static str;

    /// Document written when none exists or the existing one is unusable
    fn fresh() -> Self;

    /// Bring an older document up to [`SCHEMA_VERSION`]
    fn migrate(from_version: u64, document: &mut Map<String, Value>);
}

/// Read a document, creating, migrating or repairing it as needed
pub(crate) fn load_document<D: Document>(path: &Path) -> StorageResult<D> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating {} at {}", D::NAME, path.display());
            return reset_document(path);
        }
        Err(e) => return Err(e.into()),
    };

    let mut value: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("{} at {} is corrupted ({}); resetting", D::NAME, path.display(), e);
            return reset_document(path);
        }
    };

    let Some(object) = value.as_object_mut() else {
        warn!("{} at {} is not a JSON object; resetting", D::NAME, path.display());
        return reset_document(path);
    };

    // Documents written before versioning have no version field
    let version = object.get("version").and_then(Value::as_u64).unwrap_or(1);
    let migrated = version < SCHEMA_VERSION;
    if migrated {
        D::migrate(version, object);
        object.insert("version".to_string(), Value::from(SCHEMA_VERSION));
    }

    match serde_json::from_value::<D>(value) {
        Ok(document) => {
            if migrated {
                info!(
                    "Migrated {} at {} from version {} to {}",
                    D::NAME,
                    path.display(),
                    version,
                    SCHEMA_VERSION
                );
                save_document(path, &document)?;
            }
            Ok(document)
        }
        Err(e) => {
            warn!("{} at {} has an unexpected shape ({}); resetting", D::NAME, path.display(), e);
            reset_document(path)
        }
    }
}

/// Write a document, creating its parent directory if needed
pub(crate) fn save_document<D: Document>(path: &Path, document: &D) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(document)?;
    fs::write(path, content)?;
    Ok(())
}

fn reset_document<D: Document>(path: &Path) -> StorageResult<D> {
    let document = D::fresh();
    save_document(path, &document)?;
    Ok(document)
}

/// Insert `default` under `key` when the key is missing or null
pub(crate) fn ensure_field(object: &mut Map<String, Value>, key: &str, default: Value) {
    if object.get(key).map_or(true, Value::is_null) {
        object.insert(key.to_string(), default);
    }
}
