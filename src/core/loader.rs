//! Entity loading utilities
//!
//! Generic helpers for loading `.bct.yaml` entity files, reducing
//! boilerplate in command implementations.

use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Entity file suffix used throughout the workspace
pub const ENTITY_SUFFIX: &str = ".bct.yaml";

fn is_entity_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.ends_with(ENTITY_SUFFIX))
}

/// Load all entities of type T from a directory (non-recursive)
///
/// Scans the directory for entity files and deserializes them. Files that
/// fail to parse are silently skipped; `bct validate` reports them.
pub fn load_all<T: DeserializeOwned + 'static>(dir: &Path) -> Result<Vec<T>> {
    let mut entities = Vec::new();

    if !dir.exists() {
        return Ok(entities);
    }

    for entry in fs::read_dir(dir).into_diagnostic()? {
        let entry = entry.into_diagnostic()?;
        let path = entry.path();

        if is_entity_file(&path) {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(entity) = serde_yml::from_str::<T>(&content) {
                    entities.push(entity);
                }
            }
        }
    }

    Ok(entities)
}

/// Find an entity file whose name contains the given ID fragment
///
/// Returns the first match found.
pub fn find_entity_file(dir: &Path, id: &str) -> Option<PathBuf> {
    if !dir.exists() {
        return None;
    }

    for entry in fs::read_dir(dir).ok()? {
        let entry = entry.ok()?;
        let path = entry.path();

        if is_entity_file(&path) {
            let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if filename.contains(id) {
                return Some(path);
            }
        }
    }

    None
}

/// Load a single entity by ID fragment
///
/// Returns the path and entity if a matching file exists and parses.
pub fn load_entity<T: DeserializeOwned + 'static>(dir: &Path, id: &str) -> Result<Option<(PathBuf, T)>> {
    if let Some(path) = find_entity_file(dir, id) {
        let content = fs::read_to_string(&path).into_diagnostic()?;
        let entity: T = serde_yml::from_str(&content).into_diagnostic()?;
        return Ok(Some((path, entity)));
    }
    Ok(None)
}

/// Serialize an entity to its YAML file
pub fn save_entity<T: serde::Serialize>(path: &Path, entity: &T) -> Result<()> {
    let yaml = serde_yml::to_string(entity).into_diagnostic()?;
    fs::write(path, yaml).into_diagnostic()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_all_empty_dir() {
        let dir = tempdir().unwrap();
        let result: Result<Vec<serde_json::Value>> = load_all(dir.path());
        assert!(result.is_ok());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_load_all_nonexistent_dir() {
        let result: Result<Vec<serde_json::Value>> = load_all(Path::new("/nonexistent/path"));
        assert!(result.is_ok());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_load_all_ignores_other_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.yaml"), "a: 1").unwrap();
        fs::write(dir.path().join("CHG-X.bct.yaml"), "a: 2").unwrap();

        let loaded: Vec<serde_json::Value> = load_all(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0]["a"], 2);
    }

    #[test]
    fn test_find_entity_file_nonexistent() {
        let result = find_entity_file(Path::new("/nonexistent/path"), "CHG-123");
        assert!(result.is_none());
    }

    #[test]
    fn test_find_entity_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("CHG-01J123456789ABCDEF.bct.yaml");
        fs::write(&file_path, "id: CHG-01J123456789ABCDEF").unwrap();

        let result = find_entity_file(dir.path(), "CHG-01J123456789ABCDEF");
        assert!(result.is_some());
        assert_eq!(result.unwrap(), file_path);
    }

    #[test]
    fn test_save_then_load_entity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("value.bct.yaml");
        let value = serde_json::json!({"id": "X-1", "title": "hello"});

        save_entity(&path, &value).unwrap();
        let loaded: Option<(PathBuf, serde_json::Value)> =
            load_entity(dir.path(), "value").unwrap();
        let (_, loaded) = loaded.unwrap();
        assert_eq!(loaded["title"], "hello");
    }
}
