//! SQLite-backed entity cache for fast filtered lookups
//!
//! The cache gives list/status commands fetch-all-with-filter and
//! fetch-by-id reads (e.g. "active running changes") without re-parsing
//! every YAML file. It auto-detects file changes by content hash and syncs
//! incrementally.
//!
//! IMPORTANT: the cache is user-local and gitignored. Entity files remain
//! the source of truth; the cache can be deleted and rebuilt at any time.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::core::identity::EntityPrefix;
use crate::core::project::Project;
use crate::entities::{BomItem, RunningChange};

/// Cache file location within a project
const CACHE_FILE: &str = ".bct/cache.db";

/// Current schema version for migrations
const SCHEMA_VERSION: i32 = 2;

/// Cached BOM item row
#[derive(Debug, Clone)]
pub struct CachedItem {
    pub id: String,
    pub item_code: String,
    pub description: String,
    pub group_code: String,
    pub quantity: f64,
    pub level: u32,
    pub unit_cost: f64,
    pub extended_cost: f64,
    pub cost_source: String,
    pub status: String,
    pub file_path: PathBuf,
}

/// Cached running change row
#[derive(Debug, Clone)]
pub struct CachedChange {
    pub id: String,
    pub cn_number: String,
    pub title: String,
    pub owner: Option<String>,
    pub estimated_go_live: String,
    pub old_b_codes: Vec<String>,
    pub new_b_codes: Vec<String>,
    pub active: bool,
    pub file_path: PathBuf,
}

/// Statistics from a sync pass
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncStats {
    pub scanned: usize,
    pub updated: usize,
    pub removed: usize,
}

/// The entity cache backed by SQLite
pub struct EntityCache {
    conn: Connection,
    root: PathBuf,
}

impl EntityCache {
    /// Open (or create) the cache for a project
    pub fn open(project: &Project) -> Result<Self> {
        let path = project.root().join(CACHE_FILE);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).into_diagnostic()?;
        }
        let conn = Connection::open(&path).into_diagnostic()?;
        let mut cache = Self {
            conn,
            root: project.root().to_path_buf(),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&mut self) -> Result<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .into_diagnostic()?;

        if version != SCHEMA_VERSION {
            // Schema changed: drop and rebuild from YAML on next sync
            self.conn
                .execute_batch(
                    "DROP TABLE IF EXISTS files;
                     DROP TABLE IF EXISTS items;
                     DROP TABLE IF EXISTS changes;",
                )
                .into_diagnostic()?;
            self.conn
                .execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
                .into_diagnostic()?;
        }

        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS files (
                    path TEXT PRIMARY KEY,
                    hash TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS items (
                    id TEXT PRIMARY KEY,
                    item_code TEXT NOT NULL,
                    description TEXT NOT NULL,
                    group_code TEXT NOT NULL,
                    quantity REAL NOT NULL,
                    level INTEGER NOT NULL,
                    unit_cost REAL NOT NULL,
                    extended_cost REAL NOT NULL,
                    cost_source TEXT NOT NULL,
                    status TEXT NOT NULL,
                    path TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_items_code ON items(item_code);
                CREATE TABLE IF NOT EXISTS changes (
                    id TEXT PRIMARY KEY,
                    cn_number TEXT NOT NULL,
                    title TEXT NOT NULL,
                    owner TEXT,
                    estimated_go_live TEXT NOT NULL,
                    old_b_codes TEXT NOT NULL,
                    new_b_codes TEXT NOT NULL,
                    active INTEGER NOT NULL,
                    path TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_changes_active ON changes(active);",
            )
            .into_diagnostic()?;

        Ok(())
    }

    /// Sync the cache against the item and change directories
    pub fn sync(&mut self, project: &Project) -> Result<SyncStats> {
        let mut stats = SyncStats::default();

        let mut seen: HashSet<String> = HashSet::new();

        for prefix in [EntityPrefix::Item, EntityPrefix::Chg] {
            let dir = project.entity_dir(prefix);
            if !dir.exists() {
                continue;
            }
            for entry in WalkDir::new(&dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().to_string_lossy().ends_with(".bct.yaml"))
            {
                stats.scanned += 1;
                let rel = self.relative_path(entry.path());
                seen.insert(rel.clone());

                let content = std::fs::read_to_string(entry.path()).into_diagnostic()?;
                let hash = content_hash(&content);

                let cached_hash: Option<String> = self
                    .conn
                    .query_row(
                        "SELECT hash FROM files WHERE path = ?1",
                        params![rel],
                        |row| row.get(0),
                    )
                    .optional()
                    .into_diagnostic()?;

                if cached_hash.as_deref() == Some(hash.as_str()) {
                    continue;
                }

                match prefix {
                    EntityPrefix::Item => self.upsert_item(&rel, &content)?,
                    EntityPrefix::Chg => self.upsert_change(&rel, &content)?,
                    _ => unreachable!(),
                }

                self.conn
                    .execute(
                        "INSERT INTO files (path, hash) VALUES (?1, ?2)
                         ON CONFLICT(path) DO UPDATE SET hash = ?2",
                        params![rel, hash],
                    )
                    .into_diagnostic()?;
                stats.updated += 1;
            }
        }

        // Drop rows whose files are gone
        let known: Vec<String> = {
            let mut stmt = self
                .conn
                .prepare("SELECT path FROM files")
                .into_diagnostic()?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .into_diagnostic()?;
            rows.filter_map(|r| r.ok()).collect()
        };

        for path in known {
            if !seen.contains(&path) {
                self.conn
                    .execute("DELETE FROM files WHERE path = ?1", params![path])
                    .into_diagnostic()?;
                self.conn
                    .execute("DELETE FROM items WHERE path = ?1", params![path])
                    .into_diagnostic()?;
                self.conn
                    .execute("DELETE FROM changes WHERE path = ?1", params![path])
                    .into_diagnostic()?;
                stats.removed += 1;
            }
        }

        Ok(stats)
    }

    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }

    fn upsert_item(&self, rel: &str, content: &str) -> Result<()> {
        // Files that fail to parse are skipped; `bct validate` reports them
        let Ok(item) = serde_yml::from_str::<BomItem>(content) else {
            return Ok(());
        };
        self.conn
            .execute(
                "INSERT INTO items (id, item_code, description, group_code, quantity, level,
                                    unit_cost, extended_cost, cost_source, status, path)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                    item_code = ?2, description = ?3, group_code = ?4, quantity = ?5,
                    level = ?6, unit_cost = ?7, extended_cost = ?8, cost_source = ?9,
                    status = ?10, path = ?11",
                params![
                    item.id.to_string(),
                    item.item_code,
                    item.description,
                    item.group_code,
                    item.quantity,
                    item.level,
                    item.unit_cost(),
                    item.extended_cost(),
                    item.cost_source.to_string(),
                    item.status.to_string(),
                    rel,
                ],
            )
            .into_diagnostic()?;
        Ok(())
    }

    fn upsert_change(&self, rel: &str, content: &str) -> Result<()> {
        let Ok(change) = serde_yml::from_str::<RunningChange>(content) else {
            return Ok(());
        };
        self.conn
            .execute(
                "INSERT INTO changes (id, cn_number, title, owner, estimated_go_live,
                                      old_b_codes, new_b_codes, active, path)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    cn_number = ?2, title = ?3, owner = ?4, estimated_go_live = ?5,
                    old_b_codes = ?6, new_b_codes = ?7, active = ?8, path = ?9",
                params![
                    change.id.to_string(),
                    change.cn_number,
                    change.title,
                    change.owner,
                    change.estimated_go_live.to_string(),
                    change.old_b_codes.join(","),
                    change.new_b_codes.join(","),
                    change.active as i64,
                    rel,
                ],
            )
            .into_diagnostic()?;
        Ok(())
    }

    /// All cached items, ordered by item code
    pub fn items(&self) -> Result<Vec<CachedItem>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, item_code, description, group_code, quantity, level,
                        unit_cost, extended_cost, cost_source, status, path
                 FROM items ORDER BY item_code",
            )
            .into_diagnostic()?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CachedItem {
                    id: row.get(0)?,
                    item_code: row.get(1)?,
                    description: row.get(2)?,
                    group_code: row.get(3)?,
                    quantity: row.get(4)?,
                    level: row.get(5)?,
                    unit_cost: row.get(6)?,
                    extended_cost: row.get(7)?,
                    cost_source: row.get(8)?,
                    status: row.get(9)?,
                    file_path: PathBuf::from(row.get::<_, String>(10)?),
                })
            })
            .into_diagnostic()?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Fetch one item by code
    pub fn item_by_code(&self, code: &str) -> Result<Option<CachedItem>> {
        let items = self.items()?;
        Ok(items.into_iter().find(|i| i.item_code == code))
    }

    /// All cached changes, optionally filtered to active ones
    pub fn changes(&self, only_active: bool) -> Result<Vec<CachedChange>> {
        let sql = if only_active {
            "SELECT id, cn_number, title, owner, estimated_go_live, old_b_codes,
                    new_b_codes, active, path
             FROM changes WHERE active = 1 ORDER BY cn_number"
        } else {
            "SELECT id, cn_number, title, owner, estimated_go_live, old_b_codes,
                    new_b_codes, active, path
             FROM changes ORDER BY cn_number"
        };
        let mut stmt = self.conn.prepare(sql).into_diagnostic()?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CachedChange {
                    id: row.get(0)?,
                    cn_number: row.get(1)?,
                    title: row.get(2)?,
                    owner: row.get(3)?,
                    estimated_go_live: row.get(4)?,
                    old_b_codes: split_codes(&row.get::<_, String>(5)?),
                    new_b_codes: split_codes(&row.get::<_, String>(6)?),
                    active: row.get::<_, i64>(7)? != 0,
                    file_path: PathBuf::from(row.get::<_, String>(8)?),
                })
            })
            .into_diagnostic()?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Changes whose old-code list references the given item code
    pub fn changes_referencing(&self, code: &str) -> Result<Vec<CachedChange>> {
        Ok(self
            .changes(true)?
            .into_iter()
            .filter(|c| c.old_b_codes.iter().any(|o| o == code))
            .collect())
    }

    /// (item count, active change count)
    pub fn counts(&self) -> Result<(usize, usize)> {
        let items: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .into_diagnostic()?;
        let changes: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM changes WHERE active = 1",
                [],
                |row| row.get(0),
            )
            .into_diagnostic()?;
        Ok((items as usize, changes as usize))
    }
}

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn split_codes(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        Vec::new()
    } else {
        joined.split(',').map(|s| s.to_string()).collect()
    }
}
