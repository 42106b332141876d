//! Poll-based workspace watcher
//!
//! The original listener-style "push me every change" pattern is expressed
//! here as an explicit snapshot stream at the data-access boundary: the
//! watcher fingerprints the item and change directories and hands a freshly
//! loaded snapshot to a callback only when content actually changed. The
//! matcher stays a pure function invoked per snapshot.
//!
//! The two directories are scanned independently, so a tick can briefly
//! pair an old BOM with new changes; the next tick heals it.

use std::path::PathBuf;
use std::time::Duration;

use miette::Result;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::entities::{BomItem, RunningChange};

/// One consistent view of the watched collections
#[derive(Debug)]
pub struct WatchSnapshot {
    pub items: Vec<BomItem>,
    pub changes: Vec<RunningChange>,
}

/// Whether to keep watching after a snapshot was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchControl {
    Continue,
    Stop,
}

/// Polls the workspace and emits snapshots on content change
pub struct BomWatcher {
    item_dir: PathBuf,
    change_dir: PathBuf,
    interval: Duration,
    last_fingerprint: Option<String>,
}

impl BomWatcher {
    pub fn new(project: &Project, interval: Duration) -> Self {
        Self {
            item_dir: project.entity_dir(EntityPrefix::Item),
            change_dir: project.entity_dir(EntityPrefix::Chg),
            interval,
            last_fingerprint: None,
        }
    }

    /// Hash of every watched file's path and content, order-independent input
    fn fingerprint(&self) -> Result<String> {
        let mut entries: Vec<(String, String)> = Vec::new();

        for dir in [&self.item_dir, &self.change_dir] {
            if !dir.exists() {
                continue;
            }
            for entry in WalkDir::new(dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().to_string_lossy().ends_with(".bct.yaml"))
            {
                let content = std::fs::read_to_string(entry.path()).unwrap_or_default();
                let mut hasher = Sha256::new();
                hasher.update(content.as_bytes());
                entries.push((
                    entry.path().to_string_lossy().to_string(),
                    format!("{:x}", hasher.finalize()),
                ));
            }
        }

        entries.sort();

        let mut hasher = Sha256::new();
        for (path, hash) in entries {
            hasher.update(path.as_bytes());
            hasher.update(hash.as_bytes());
        }
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Check once: returns a snapshot when content changed since the last poll
    ///
    /// The first poll always emits.
    pub fn poll(&mut self) -> Result<Option<WatchSnapshot>> {
        let fingerprint = self.fingerprint()?;
        if self.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            return Ok(None);
        }
        self.last_fingerprint = Some(fingerprint);

        let items: Vec<BomItem> = loader::load_all(&self.item_dir)?;
        let changes: Vec<RunningChange> = loader::load_all(&self.change_dir)?;
        Ok(Some(WatchSnapshot { items, changes }))
    }

    /// Block, delivering a snapshot to the callback on every content change
    /// until the callback asks to stop
    pub fn watch(&mut self, mut on_snapshot: impl FnMut(WatchSnapshot) -> WatchControl) -> Result<()> {
        loop {
            if let Some(snapshot) = self.poll()? {
                if on_snapshot(snapshot) == WatchControl::Stop {
                    return Ok(());
                }
            }
            std::thread::sleep(self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Entity;
    use crate::core::project::ProjectMeta;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, Project) {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), &ProjectMeta::default()).unwrap();
        (tmp, project)
    }

    fn write_item(project: &Project, code: &str) {
        let item = BomItem::new(code, format!("{} part", code), 1.0, "Author");
        let path = project.entity_path(EntityPrefix::Item, item.id());
        std::fs::write(&path, serde_yml::to_string(&item).unwrap()).unwrap();
    }

    #[test]
    fn test_first_poll_emits() {
        let (_tmp, project) = setup();
        write_item(&project, "B100234");

        let mut watcher = BomWatcher::new(&project, Duration::from_millis(10));
        let snapshot = watcher.poll().unwrap().unwrap();
        assert_eq!(snapshot.items.len(), 1);
        assert!(snapshot.changes.is_empty());
    }

    #[test]
    fn test_unchanged_content_does_not_emit() {
        let (_tmp, project) = setup();
        write_item(&project, "B100234");

        let mut watcher = BomWatcher::new(&project, Duration::from_millis(10));
        assert!(watcher.poll().unwrap().is_some());
        assert!(watcher.poll().unwrap().is_none());
        assert!(watcher.poll().unwrap().is_none());
    }

    #[test]
    fn test_new_file_triggers_emit() {
        let (_tmp, project) = setup();
        write_item(&project, "B100234");

        let mut watcher = BomWatcher::new(&project, Duration::from_millis(10));
        assert!(watcher.poll().unwrap().is_some());

        write_item(&project, "B200555");
        let snapshot = watcher.poll().unwrap().unwrap();
        assert_eq!(snapshot.items.len(), 2);
    }

    #[test]
    fn test_empty_workspace_emits_empty_snapshot_once() {
        let (_tmp, project) = setup();

        let mut watcher = BomWatcher::new(&project, Duration::from_millis(10));
        let snapshot = watcher.poll().unwrap().unwrap();
        assert!(snapshot.items.is_empty());
        assert!(watcher.poll().unwrap().is_none());
    }
}
