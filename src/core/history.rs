//! Spec version history - the versioned-history read seam
//!
//! Submitted spec versions are frozen into `specs/history/` as
//! `SPEC-v0003.bct.yaml` files. The comparison engine depends on the
//! [`SpecHistory`] trait rather than the filesystem so tests can run
//! against an in-memory store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::entities::Spec;

/// Errors raised by history stores
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("version {0} already frozen in history")]
    VersionExists(u32),

    #[error("failed to parse spec version file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Read access to frozen spec versions, ordered by version number
pub trait SpecHistory {
    /// All frozen version numbers, ascending
    fn versions(&self) -> Result<Vec<u32>, HistoryError>;

    /// Load one frozen version; None when absent (not an error)
    fn load_version(&self, version: u32) -> Result<Option<Spec>, HistoryError>;

    /// The highest frozen version, if any
    fn latest_version(&self) -> Result<Option<u32>, HistoryError> {
        Ok(self.versions()?.into_iter().max())
    }
}

/// Filesystem-backed history over a `specs/history/` directory
pub struct FsSpecHistory {
    dir: PathBuf,
}

impl FsSpecHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn version_path(&self, version: u32) -> PathBuf {
        self.dir.join(format!("SPEC-v{:04}.bct.yaml", version))
    }

    fn parse_version_from_path(path: &Path) -> Option<u32> {
        let name = path.file_name()?.to_str()?;
        let rest = name.strip_prefix("SPEC-v")?;
        let digits = rest.strip_suffix(".bct.yaml")?;
        digits.parse().ok()
    }

    /// Freeze a spec version into history; refuses to overwrite
    pub fn write_version(&self, spec: &Spec) -> Result<PathBuf, HistoryError> {
        let path = self.version_path(spec.version);
        if path.exists() {
            return Err(HistoryError::VersionExists(spec.version));
        }
        std::fs::create_dir_all(&self.dir)?;
        let yaml = serde_yml::to_string(spec).map_err(|e| HistoryError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, yaml)?;
        Ok(path)
    }
}

impl SpecHistory for FsSpecHistory {
    fn versions(&self) -> Result<Vec<u32>, HistoryError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if let Some(v) = Self::parse_version_from_path(&path) {
                versions.push(v);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    fn load_version(&self, version: u32) -> Result<Option<Spec>, HistoryError> {
        let path = self.version_path(version);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let spec = serde_yml::from_str(&contents).map_err(|e| HistoryError::ParseError {
            path,
            message: e.to_string(),
        })?;
        Ok(Some(spec))
    }
}

/// In-memory history for tests and previews
#[derive(Default)]
pub struct InMemorySpecHistory {
    specs: BTreeMap<u32, Spec>,
    reads: std::cell::Cell<usize>,
}

impl InMemorySpecHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spec: Spec) {
        self.specs.insert(spec.version, spec);
    }

    /// Number of load_version calls served (used to assert short-circuits)
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }
}

impl SpecHistory for InMemorySpecHistory {
    fn versions(&self) -> Result<Vec<u32>, HistoryError> {
        Ok(self.specs.keys().copied().collect())
    }

    fn load_version(&self, version: u32) -> Result<Option<Spec>, HistoryError> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.specs.get(&version).cloned())
    }
}
