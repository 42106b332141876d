//! Entity identity system using type-prefixed ULIDs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Entity type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityPrefix {
    /// BOM line item
    Item,
    /// Assembly / template group
    Asm,
    /// Vendor
    Vnd,
    /// Vendor contract price
    Ctr,
    /// Running engineering change
    Chg,
    /// Product spec (versioned configuration document)
    Spec,
    /// Spec group mapping
    Map,
    /// Kanban task
    Task,
}

impl EntityPrefix {
    /// Get the string representation of the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Item => "ITEM",
            EntityPrefix::Asm => "ASM",
            EntityPrefix::Vnd => "VND",
            EntityPrefix::Ctr => "CTR",
            EntityPrefix::Chg => "CHG",
            EntityPrefix::Spec => "SPEC",
            EntityPrefix::Map => "MAP",
            EntityPrefix::Task => "TASK",
        }
    }

    /// Get all valid prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Item,
            EntityPrefix::Asm,
            EntityPrefix::Vnd,
            EntityPrefix::Ctr,
            EntityPrefix::Chg,
            EntityPrefix::Spec,
            EntityPrefix::Map,
            EntityPrefix::Task,
        ]
    }

    /// Try to determine entity prefix from a filename
    /// Looks for patterns like "ITEM-xxx.bct.yaml" or "item.schema.json"
    pub fn from_filename(filename: &str) -> Option<Self> {
        let upper = filename.to_uppercase();
        for prefix in Self::all() {
            let prefix_str = prefix.as_str();
            // Match "ITEM-xxx" pattern at start
            if upper.starts_with(&format!("{}-", prefix_str)) {
                return Some(*prefix);
            }
            // Match "item.schema.json" pattern
            if upper.starts_with(&format!("{}.", prefix_str)) {
                return Some(*prefix);
            }
        }
        None
    }

    /// Try to determine entity prefix from a file path by examining parent directories
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        // First try the filename
        if let Some(filename) = path.file_name() {
            if let Some(prefix) = Self::from_filename(&filename.to_string_lossy()) {
                return Some(prefix);
            }
        }

        // Then look at parent directories
        for component in path.components() {
            if let std::path::Component::Normal(os_str) = component {
                let dir_name = os_str.to_string_lossy().to_lowercase();
                match dir_name.as_str() {
                    "items" => return Some(EntityPrefix::Item),
                    "groups" | "assemblies" => return Some(EntityPrefix::Asm),
                    "vendors" => return Some(EntityPrefix::Vnd),
                    "contracts" => return Some(EntityPrefix::Ctr),
                    "changes" => return Some(EntityPrefix::Chg),
                    "specs" | "history" => return Some(EntityPrefix::Spec),
                    "mappings" => return Some(EntityPrefix::Map),
                    "tasks" => return Some(EntityPrefix::Task),
                    _ => {}
                }
            }
        }
        None
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ITEM" => Ok(EntityPrefix::Item),
            "ASM" => Ok(EntityPrefix::Asm),
            "VND" => Ok(EntityPrefix::Vnd),
            "CTR" => Ok(EntityPrefix::Ctr),
            "CHG" => Ok(EntityPrefix::Chg),
            "SPEC" => Ok(EntityPrefix::Spec),
            "MAP" => Ok(EntityPrefix::Map),
            "TASK" => Ok(EntityPrefix::Task),
            _ => Err(IdParseError::InvalidPrefix(s.to_string())),
        }
    }
}

/// A unique entity identifier combining a type prefix and ULID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Create a new EntityId with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    /// Create an EntityId from a prefix and existing ULID
    pub fn from_parts(prefix: EntityPrefix, ulid: Ulid) -> Self {
        Self { prefix, ulid }
    }

    /// Get the entity prefix
    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    /// Get the ULID component
    pub fn ulid(&self) -> Ulid {
        self.ulid
    }

    /// Parse an EntityId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix_str, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        let prefix = prefix_str.parse()?;
        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing entity IDs
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid entity prefix: '{0}' (valid: ITEM, ASM, VND, CTR, CHG, SPEC, MAP, TASK)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in entity ID: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),
}
