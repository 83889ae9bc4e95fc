pub mod json_store;
pub mod settings_store;

pub use json_store::{Alert, JsonStore, PyramidSink};
pub use settings_store::SettingsStore;

use crate::error::{EngineError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes through a uniquely named temporary file in the target's directory
/// and renames it over the target, so concurrent writers never share a
/// temporary and readers never see a partial file.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path)
        .map_err(|e| EngineError::PersistenceError(format!("replacing {}: {}", path.display(), e.error)))?;
    Ok(())
}
