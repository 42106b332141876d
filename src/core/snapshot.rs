//! BOM snapshots - frozen copies of the item list with diffing
//!
//! A snapshot freezes every BOM line under a label so later states can be
//! compared against it. Snapshots are plain YAML documents under
//! `snapshots/`, named by label.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::entities::BomItem;

/// Errors raised by snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot '{0}' already exists")]
    AlreadyExists(String),

    #[error("snapshot '{0}' not found")]
    NotFound(String),

    #[error("invalid snapshot label '{0}' (use letters, digits, '-', '_')")]
    InvalidLabel(String),

    #[error("failed to parse snapshot {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A frozen copy of the BOM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomSnapshot {
    /// Snapshot label (e.g. "pre-dtx")
    pub label: String,

    /// Free-text message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// When the snapshot was taken
    pub created: DateTime<Utc>,

    /// Who took it
    pub author: String,

    /// The frozen items
    pub items: Vec<BomItem>,
}

impl BomSnapshot {
    pub fn new(
        label: impl Into<String>,
        items: Vec<BomItem>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            message: None,
            created: Utc::now(),
            author: author.into(),
            items,
        }
    }

    /// Total extended cost of the frozen BOM
    pub fn total_cost(&self) -> f64 {
        self.items.iter().map(|i| i.extended_cost()).sum()
    }
}

/// One changed line between two snapshots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotChange {
    pub item_code: String,
    pub kind: SnapshotChangeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotChangeKind {
    Added,
    Removed,
    QuantityChanged { from: f64, to: f64 },
    CostChanged { from: f64, to: f64 },
}

/// Diff two snapshots, keyed by item code, ordered by code
///
/// An item whose quantity and unit cost both moved reports the quantity
/// change; quantity is the structural edit, cost follows pricing.
pub fn diff_snapshots(from: &BomSnapshot, to: &BomSnapshot) -> Vec<SnapshotChange> {
    let from_by_code: BTreeMap<&str, &BomItem> = from
        .items
        .iter()
        .map(|i| (i.item_code.as_str(), i))
        .collect();
    let to_by_code: BTreeMap<&str, &BomItem> =
        to.items.iter().map(|i| (i.item_code.as_str(), i)).collect();

    let mut changes = Vec::new();

    for (code, old) in &from_by_code {
        match to_by_code.get(code) {
            None => changes.push(SnapshotChange {
                item_code: code.to_string(),
                kind: SnapshotChangeKind::Removed,
            }),
            Some(new) => {
                if old.quantity != new.quantity {
                    changes.push(SnapshotChange {
                        item_code: code.to_string(),
                        kind: SnapshotChangeKind::QuantityChanged {
                            from: old.quantity,
                            to: new.quantity,
                        },
                    });
                } else if old.unit_cost() != new.unit_cost() {
                    changes.push(SnapshotChange {
                        item_code: code.to_string(),
                        kind: SnapshotChangeKind::CostChanged {
                            from: old.unit_cost(),
                            to: new.unit_cost(),
                        },
                    });
                }
            }
        }
    }

    for code in to_by_code.keys() {
        if !from_by_code.contains_key(code) {
            changes.push(SnapshotChange {
                item_code: code.to_string(),
                kind: SnapshotChangeKind::Added,
            });
        }
    }

    changes.sort_by(|a, b| a.item_code.cmp(&b.item_code));
    changes
}

fn label_is_valid(label: &str) -> bool {
    !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Filesystem store for snapshots
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{}.snapshot.yaml", label))
    }

    /// Write a snapshot; refuses to overwrite an existing label
    pub fn write(&self, snapshot: &BomSnapshot) -> Result<PathBuf, SnapshotError> {
        if !label_is_valid(&snapshot.label) {
            return Err(SnapshotError::InvalidLabel(snapshot.label.clone()));
        }
        let path = self.path_for(&snapshot.label);
        if path.exists() {
            return Err(SnapshotError::AlreadyExists(snapshot.label.clone()));
        }
        std::fs::create_dir_all(&self.dir)?;
        let yaml = serde_yml::to_string(snapshot).map_err(|e| SnapshotError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, yaml)?;
        Ok(path)
    }

    /// Load a snapshot by label
    pub fn load(&self, label: &str) -> Result<BomSnapshot, SnapshotError> {
        let path = self.path_for(label);
        if !path.exists() {
            return Err(SnapshotError::NotFound(label.to_string()));
        }
        let contents = std::fs::read_to_string(&path)?;
        serde_yml::from_str(&contents).map_err(|e| SnapshotError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// List snapshot labels with timestamps, newest first
    pub fn list(&self) -> Result<Vec<(String, DateTime<Utc>)>, SnapshotError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(label) = name.strip_suffix(".snapshot.yaml") else {
                continue;
            };
            let snapshot = self.load(label)?;
            out.push((label.to_string(), snapshot.created));
        }
        out.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn item(code: &str, qty: f64, material: f64) -> BomItem {
        let mut item = BomItem::new(code, format!("{} part", code), qty, "Author");
        item.material_cost = material;
        item
    }

    #[test]
    fn test_diff_identical_snapshots_is_empty() {
        let items = vec![item("B100234", 2.0, 4.5)];
        let a = BomSnapshot::new("a", items.clone(), "Author");
        let b = BomSnapshot::new("b", items, "Author");
        assert!(diff_snapshots(&a, &b).is_empty());
    }

    #[test]
    fn test_diff_classifies_changes() {
        let a = BomSnapshot::new(
            "a",
            vec![
                item("B100234", 2.0, 4.5),
                item("B200555", 1.0, 38.0),
                item("B300111", 4.0, 0.2),
            ],
            "Author",
        );
        let b = BomSnapshot::new(
            "b",
            vec![
                item("B100234", 3.0, 4.5),  // quantity changed
                item("B300111", 4.0, 0.25), // cost changed
                item("B400999", 1.0, 12.0), // added
            ],
            "Author",
        );

        let changes = diff_snapshots(&a, &b);
        assert_eq!(changes.len(), 4);

        // ordered by item code
        assert_eq!(changes[0].item_code, "B100234");
        assert!(matches!(
            changes[0].kind,
            SnapshotChangeKind::QuantityChanged { from, to } if from == 2.0 && to == 3.0
        ));
        assert_eq!(changes[1].item_code, "B200555");
        assert!(matches!(changes[1].kind, SnapshotChangeKind::Removed));
        assert!(matches!(
            changes[2].kind,
            SnapshotChangeKind::CostChanged { from, to } if from == 0.2 && to == 0.25
        ));
        assert!(matches!(changes[3].kind, SnapshotChangeKind::Added));
    }

    #[test]
    fn test_store_write_load_list() {
        let tmp = tempdir().unwrap();
        let store = SnapshotStore::new(tmp.path());

        let snap = BomSnapshot::new("pre-dtx", vec![item("B100234", 2.0, 4.5)], "Author");
        store.write(&snap).unwrap();

        let loaded = store.load("pre-dtx").unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.total_cost(), 9.0);

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, "pre-dtx");
    }

    #[test]
    fn test_store_refuses_duplicate_label() {
        let tmp = tempdir().unwrap();
        let store = SnapshotStore::new(tmp.path());

        let snap = BomSnapshot::new("pre-dtx", vec![], "Author");
        store.write(&snap).unwrap();
        let err = store.write(&snap).unwrap_err();
        assert!(matches!(err, SnapshotError::AlreadyExists(_)));
    }

    #[test]
    fn test_store_rejects_bad_label() {
        let tmp = tempdir().unwrap();
        let store = SnapshotStore::new(tmp.path());

        let snap = BomSnapshot::new("../evil", vec![], "Author");
        let err = store.write(&snap).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidLabel(_)));

        let err = store.load("missing").unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound(_)));
    }
}
