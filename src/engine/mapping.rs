//! Spec mapping engine
//!
//! Resolves (bike type, category, option value) triples into BOM template
//! group codes. Exact learned mappings win; otherwise a sibling-context
//! heuristic proposes a low-confidence union; otherwise the option needs
//! manual mapping. Confirmations push confidence to 1.0 and are persisted
//! through [`MappingStore`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::config::MappingConfig;
use crate::core::entity::Entity;
use crate::entities::mapping::{MappingError, SpecGroupMapping};
use crate::entities::{MappingKey, Selection};

/// Confidence assigned to heuristic (sibling-derived) proposals
pub const HEURISTIC_CONFIDENCE: f64 = 0.25;

/// Confidence band, for UI colouring and the low-confidence admin queue
///
/// Thresholds are configuration constants (`mapping.low_confidence` /
/// `mapping.high_confidence`), not hardcoded per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

impl ConfidenceBand {
    /// Classify a score against the configured thresholds
    pub fn classify(score: f64, config: &MappingConfig) -> Self {
        if score < config.low_confidence {
            ConfidenceBand::Low
        } else if score > config.high_confidence {
            ConfidenceBand::High
        } else {
            ConfidenceBand::Medium
        }
    }
}

impl std::fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceBand::Low => write!(f, "low"),
            ConfidenceBand::Medium => write!(f, "medium"),
            ConfidenceBand::High => write!(f, "high"),
        }
    }
}

/// Where a suggestion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionSource {
    /// An exact learned mapping for the triple
    Learned,
    /// Derived from sibling selections in the same spec
    Heuristic,
    /// No signal - needs manual mapping
    Unmapped,
}

/// Result of resolving a spec option to template groups
#[derive(Debug, Clone)]
pub struct SuggestedMapping {
    pub group_codes: Vec<String>,
    pub confidence: f64,
    pub source: SuggestionSource,
}

impl SuggestedMapping {
    fn unmapped() -> Self {
        Self {
            group_codes: Vec::new(),
            confidence: 0.0,
            source: SuggestionSource::Unmapped,
        }
    }

    /// Confidence band under the given thresholds
    pub fn band(&self, config: &MappingConfig) -> ConfidenceBand {
        ConfidenceBand::classify(self.confidence, config)
    }

    /// Whether the option cannot be satisfied by existing template groups
    pub fn needs_manual_mapping(&self) -> bool {
        self.group_codes.is_empty()
    }
}

/// In-memory mapping table keyed by the composite triple
///
/// Later inserts replace earlier ones for the same key, so loading global
/// mappings before project mappings gives project entries precedence.
#[derive(Debug, Default)]
pub struct MappingIndex {
    by_key: HashMap<MappingKey, SpecGroupMapping>,
}

impl MappingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mappings(mappings: impl IntoIterator<Item = SpecGroupMapping>) -> Self {
        let mut index = Self::new();
        for mapping in mappings {
            index.insert(mapping);
        }
        index
    }

    pub fn insert(&mut self, mapping: SpecGroupMapping) {
        self.by_key.insert(mapping.key(), mapping);
    }

    pub fn get(&self, key: &MappingKey) -> Option<&SpecGroupMapping> {
        self.by_key.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpecGroupMapping> {
        self.by_key.values()
    }

    /// Mappings below the low-confidence threshold (the admin review queue),
    /// ordered by ascending confidence
    pub fn low_confidence(&self, config: &MappingConfig) -> Vec<&SpecGroupMapping> {
        let mut queue: Vec<&SpecGroupMapping> = self
            .by_key
            .values()
            .filter(|m| ConfidenceBand::classify(m.confidence, config) == ConfidenceBand::Low)
            .collect();
        queue.sort_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key().to_string().cmp(&b.key().to_string()))
        });
        queue
    }
}

/// Whether two category names are the same or closely related
///
/// Case-insensitive equality or word-prefix containment ("Frame Colour"
/// relates to "Frame"). Anything fuzzier is out of scope; option values
/// always match exactly.
fn category_similar(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return true;
    }
    a.starts_with(&format!("{} ", b)) || b.starts_with(&format!("{} ", a))
}

/// Resolve a spec option to template groups
///
/// Exact learned mapping first. Otherwise the heuristic inspects `context`
/// (the spec's other selections): any sibling whose own mapping sits in the
/// same or a related category contributes its group codes, and the union is
/// proposed at low confidence. No signal at all returns an empty suggestion
/// at confidence 0.
pub fn suggest_groups(
    index: &MappingIndex,
    bike_type: &str,
    category: &str,
    option_value: &str,
    context: &[Selection],
) -> SuggestedMapping {
    let key = MappingKey::new(bike_type, category, option_value);
    if let Some(mapping) = index.get(&key) {
        return SuggestedMapping {
            group_codes: mapping.group_codes.clone(),
            confidence: mapping.confidence,
            source: SuggestionSource::Learned,
        };
    }

    let mut union: Vec<String> = Vec::new();
    for sibling in context {
        if sibling.category == category && sibling.option_value == option_value {
            continue;
        }
        let sibling_key = MappingKey::new(bike_type, &sibling.category, &sibling.option_value);
        let Some(mapping) = index.get(&sibling_key) else {
            continue;
        };
        if !category_similar(&sibling.category, category) {
            continue;
        }
        for code in &mapping.group_codes {
            if !union.contains(code) {
                union.push(code.clone());
            }
        }
    }

    if union.is_empty() {
        SuggestedMapping::unmapped()
    } else {
        SuggestedMapping {
            group_codes: union,
            confidence: HEURISTIC_CONFIDENCE,
            source: SuggestionSource::Heuristic,
        }
    }
}

/// Errors raised by the mapping store
#[derive(Debug, Error)]
pub enum MappingStoreError {
    #[error(transparent)]
    Validation(#[from] MappingError),

    #[error("failed to parse mapping file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Filesystem store for mapping records
///
/// Mappings are organization-wide: an optional global directory is read
/// first and the project directory second, so project entries win on key
/// collisions. Writes always land in the project directory.
pub struct MappingStore {
    project_dir: PathBuf,
    global_dir: Option<PathBuf>,
}

impl MappingStore {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            global_dir: None,
        }
    }

    pub fn with_global(mut self, global_dir: Option<PathBuf>) -> Self {
        self.global_dir = global_dir;
        self
    }

    fn load_dir(dir: &Path, out: &mut Vec<(PathBuf, SpecGroupMapping)>) -> Result<(), MappingStoreError> {
        if !dir.exists() {
            return Ok(());
        }
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.to_string_lossy().ends_with(".bct.yaml") {
                continue;
            }
            let contents = std::fs::read_to_string(&path)?;
            let mapping = serde_yml::from_str(&contents).map_err(|e| {
                MappingStoreError::ParseError {
                    path: path.clone(),
                    message: e.to_string(),
                }
            })?;
            out.push((path, mapping));
        }
        Ok(())
    }

    /// Load all mapping records (global first, then project)
    pub fn load_all(&self) -> Result<Vec<SpecGroupMapping>, MappingStoreError> {
        let mut records = Vec::new();
        if let Some(global) = &self.global_dir {
            Self::load_dir(global, &mut records)?;
        }
        Self::load_dir(&self.project_dir, &mut records)?;
        Ok(records.into_iter().map(|(_, m)| m).collect())
    }

    /// Build the lookup index (project entries take precedence)
    pub fn load_index(&self) -> Result<MappingIndex, MappingStoreError> {
        Ok(MappingIndex::from_mappings(self.load_all()?))
    }

    fn find_in_project(
        &self,
        key: &MappingKey,
    ) -> Result<Option<(PathBuf, SpecGroupMapping)>, MappingStoreError> {
        let mut records = Vec::new();
        Self::load_dir(&self.project_dir, &mut records)?;
        Ok(records.into_iter().find(|(_, m)| &m.key() == key))
    }

    fn write(&self, mapping: &SpecGroupMapping, path: &Path) -> Result<(), MappingStoreError> {
        std::fs::create_dir_all(&self.project_dir)?;
        let yaml =
            serde_yml::to_string(mapping).map_err(|e| MappingStoreError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Upsert a confirmed mapping
    ///
    /// Confirming an existing record sets confidence to 1.0, replaces its
    /// group codes, and bumps the usage counter; the record itself is never
    /// deleted. An empty group list is a caller error, rejected before any
    /// write.
    pub fn save_mapping(
        &self,
        bike_type: &str,
        category: &str,
        option_value: &str,
        group_codes: Vec<String>,
        user: &str,
    ) -> Result<SpecGroupMapping, MappingStoreError> {
        if group_codes.is_empty() {
            return Err(MappingError::EmptyGroupCodes.into());
        }

        let key = MappingKey::new(bike_type, category, option_value);
        match self.find_in_project(&key)? {
            Some((path, mut existing)) => {
                existing.group_codes = group_codes;
                existing.confirm(user);
                self.write(&existing, &path)?;
                Ok(existing)
            }
            None => {
                let mapping = SpecGroupMapping::confirmed(key, group_codes, user)?;
                let path = self
                    .project_dir
                    .join(format!("{}.bct.yaml", mapping.id()));
                self.write(&mapping, &path)?;
                Ok(mapping)
            }
        }
    }

    /// Seed an unconfirmed mapping at the default suggested confidence
    ///
    /// No-op if the triple is already mapped in the project.
    pub fn record_suggestion(
        &self,
        bike_type: &str,
        category: &str,
        option_value: &str,
        group_codes: Vec<String>,
        author: &str,
    ) -> Result<Option<SpecGroupMapping>, MappingStoreError> {
        let key = MappingKey::new(bike_type, category, option_value);
        if self.find_in_project(&key)?.is_some() {
            return Ok(None);
        }
        let mapping = SpecGroupMapping::suggested(key, group_codes, author)?;
        let path = self
            .project_dir
            .join(format!("{}.bct.yaml", mapping.id()));
        self.write(&mapping, &path)?;
        Ok(Some(mapping))
    }
}
