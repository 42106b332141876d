//! Core module - fundamental types and utilities

pub mod cache;
pub mod config;
pub mod entity;
pub mod history;
pub mod identity;
pub mod loader;
pub mod project;
pub mod snapshot;
pub mod watch;
pub mod workflow;

pub use cache::{CachedChange, CachedItem, EntityCache, SyncStats};
pub use config::{Config, MappingConfig};
pub use entity::{Entity, Priority, Status};
pub use history::{FsSpecHistory, HistoryError, InMemorySpecHistory, SpecHistory};
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use project::{Gate, Project, ProjectError, ProjectMeta};
pub use snapshot::{BomSnapshot, SnapshotChange, SnapshotChangeKind, SnapshotStore};
pub use watch::{BomWatcher, WatchControl, WatchSnapshot};
pub use workflow::{DecisionRecord, SpecStatus, SubmissionRecord, WorkflowError};
