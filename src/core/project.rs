//! Project workspace discovery and structure

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::EntityPrefix;

/// A named project milestone date (e.g. "DTx")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    /// Gate name
    pub name: String,

    /// Gate date
    pub date: NaiveDate,
}

/// Project metadata stored in .bct/project.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectMeta {
    /// Project name
    pub name: String,

    /// Bike type this project builds (used as the mapping key dimension)
    pub bike_type: String,

    /// Named milestone dates
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gates: Vec<Gate>,
}

impl ProjectMeta {
    /// Look up a gate date by name (case-insensitive)
    pub fn gate_date(&self, name: &str) -> Option<NaiveDate> {
        self.gates
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .map(|g| g.date)
    }

    /// The DTx gate date, if configured
    pub fn dtx_date(&self) -> Option<NaiveDate> {
        self.gate_date("DTx")
    }
}

/// Represents a BCT project workspace
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .bct/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            let bct_dir = current.join(".bct");
            if bct_dir.is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path, meta: &ProjectMeta) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let bct_dir = root.join(".bct");
        if bct_dir.exists() {
            return Err(ProjectError::AlreadyExists(root.clone()));
        }

        Self::write_structure(&root, meta)?;
        Ok(Self { root })
    }

    /// Force initialization even if .bct/ exists
    pub fn init_force(path: &Path, meta: &ProjectMeta) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_structure(&root, meta)?;
        Ok(Self { root })
    }

    fn write_structure(root: &Path, meta: &ProjectMeta) -> Result<(), ProjectError> {
        let bct_dir = root.join(".bct");
        std::fs::create_dir_all(&bct_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        // Default config
        let config_path = bct_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        // Project metadata
        let meta_path = bct_dir.join("project.yaml");
        let meta_yaml = serde_yml::to_string(meta)
            .map_err(|e| ProjectError::MetaError(e.to_string()))?;
        std::fs::write(&meta_path, meta_yaml)
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Self::create_entity_dirs(root)?;
        Ok(())
    }

    fn default_config() -> &'static str {
        r#"# BCT Project Configuration

# Default author for new entities (can be overridden by global config)
# author: ""

# Editor to use for `bct edit` commands (default: $EDITOR)
# editor: ""

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto

# Mapping confidence band thresholds
# mapping:
#   low_confidence: 0.5
#   high_confidence: 0.85
"#
    }

    fn create_entity_dirs(root: &Path) -> Result<(), ProjectError> {
        let dirs = [
            "bom/items",
            "bom/groups",
            "vendors",
            "vendors/contracts",
            "changes",
            "specs",
            "specs/history",
            "mappings",
            "tasks",
            "snapshots",
        ];

        for dir in dirs {
            std::fs::create_dir_all(root.join(dir))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(())
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .bct configuration directory
    pub fn bct_dir(&self) -> PathBuf {
        self.root.join(".bct")
    }

    /// Load project metadata from .bct/project.yaml
    pub fn meta(&self) -> Result<ProjectMeta, ProjectError> {
        let path = self.bct_dir().join("project.yaml");
        if !path.exists() {
            return Ok(ProjectMeta::default());
        }
        let contents =
            std::fs::read_to_string(&path).map_err(|e| ProjectError::IoError(e.to_string()))?;
        serde_yml::from_str(&contents).map_err(|e| ProjectError::MetaError(e.to_string()))
    }

    /// Write project metadata back to .bct/project.yaml
    pub fn write_meta(&self, meta: &ProjectMeta) -> Result<(), ProjectError> {
        let path = self.bct_dir().join("project.yaml");
        let yaml =
            serde_yml::to_string(meta).map_err(|e| ProjectError::MetaError(e.to_string()))?;
        std::fs::write(&path, yaml).map_err(|e| ProjectError::IoError(e.to_string()))
    }

    /// Get the directory for a given entity prefix
    pub fn entity_directory(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Item => "bom/items",
            EntityPrefix::Asm => "bom/groups",
            EntityPrefix::Vnd => "vendors",
            EntityPrefix::Ctr => "vendors/contracts",
            EntityPrefix::Chg => "changes",
            EntityPrefix::Spec => "specs",
            EntityPrefix::Map => "mappings",
            EntityPrefix::Task => "tasks",
        }
    }

    /// Get the absolute directory for a given entity prefix
    pub fn entity_dir(&self, prefix: EntityPrefix) -> PathBuf {
        self.root.join(Self::entity_directory(prefix))
    }

    /// Get the path for a new entity file
    pub fn entity_path(&self, prefix: EntityPrefix, id: &crate::core::identity::EntityId) -> PathBuf {
        self.entity_dir(prefix).join(format!("{}.bct.yaml", id))
    }

    /// Get the directory holding submitted spec version snapshots
    pub fn spec_history_dir(&self) -> PathBuf {
        self.root.join("specs/history")
    }

    /// Get the directory holding BOM snapshots
    pub fn snapshot_dir(&self) -> PathBuf {
        self.root.join("snapshots")
    }

    /// Iterate all entity files of a given prefix type
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> impl Iterator<Item = PathBuf> {
        let dir = self.entity_dir(prefix);
        let skip_history = prefix == EntityPrefix::Spec;
        walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(move |e| {
                // specs/history holds frozen versions, not working entities
                !(skip_history
                    && e.path()
                        .components()
                        .any(|c| c.as_os_str() == "history"))
            })
            .filter(|e| e.path().to_string_lossy().ends_with(".bct.yaml"))
            .map(|e| e.path().to_path_buf())
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a BCT project (searched from {searched_from:?}). Run 'bct init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("BCT project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("invalid project metadata: {0}")]
    MetaError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_meta() -> ProjectMeta {
        ProjectMeta {
            name: "Test Project".to_string(),
            bike_type: "gravel".to_string(),
            gates: vec![Gate {
                name: "DTx".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            }],
        }
    }

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), &test_meta()).unwrap();

        assert!(project.bct_dir().exists());
        assert!(project.bct_dir().join("config.yaml").exists());
        assert!(project.bct_dir().join("project.yaml").exists());
        assert!(project.root().join("bom/items").is_dir());
        assert!(project.root().join("bom/groups").is_dir());
        assert!(project.root().join("changes").is_dir());
        assert!(project.root().join("specs/history").is_dir());
        assert!(project.root().join("mappings").is_dir());
        assert!(project.root().join("snapshots").is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path(), &test_meta()).unwrap();

        let err = Project::init(tmp.path(), &test_meta()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_project_discover_finds_bct_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path(), &test_meta()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_bct_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_meta_roundtrip_and_gate_lookup() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), &test_meta()).unwrap();

        let meta = project.meta().unwrap();
        assert_eq!(meta.name, "Test Project");
        assert_eq!(meta.bike_type, "gravel");
        assert_eq!(
            meta.dtx_date(),
            Some(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
        );
        assert_eq!(meta.gate_date("dtx"), meta.dtx_date());
        assert_eq!(meta.gate_date("SOP"), None);
    }

    #[test]
    fn test_iter_entity_files_skips_spec_history() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), &test_meta()).unwrap();

        std::fs::write(project.root().join("specs/working.bct.yaml"), "id: x").unwrap();
        std::fs::write(
            project.root().join("specs/history/SPEC-v0001.bct.yaml"),
            "id: y",
        )
        .unwrap();

        let files: Vec<_> = project.iter_entity_files(EntityPrefix::Spec).collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("working.bct.yaml"));
    }
}
