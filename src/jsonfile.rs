//! Small JSON-array files used for profiles and prompts.

use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;

use crate::error::{Error, Result};

/// A missing or blank file reads as an empty list.
pub fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(path, e)),
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&raw)?)
}

pub fn write_list<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(path, json).map_err(|e| Error::io(path, e))
}
