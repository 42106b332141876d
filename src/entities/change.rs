//! Running change entity - in-flight part swaps with go-live dates
//!
//! A running change (CN) swaps one or more old B-codes for one or more new
//! B-codes as of an estimated go-live date. Changes are created by CSV
//! import or `bct change new`, read continuously by the matcher, and
//! deactivated - never deleted - when superseded. Only the active flag and
//! the free-text status note may change after import.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// Running engineering change record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningChange {
    /// Unique identifier (CHG-...)
    pub id: EntityId,

    /// Change notice number (e.g. "CN-0099")
    pub cn_number: String,

    /// Short title
    pub title: String,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Owner / assignee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Estimated go-live date
    pub estimated_go_live: NaiveDate,

    /// B-codes being replaced
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub old_b_codes: Vec<String>,

    /// Replacement B-codes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_b_codes: Vec<String>,

    /// Whether the change is still in effect
    #[serde(default = "default_active")]
    pub active: bool,

    /// Free-text status note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_note: Option<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author name
    pub author: String,

    /// Revision counter for entity updates
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_active() -> bool {
    true
}

fn default_revision() -> u32 {
    1
}

impl Entity for RunningChange {
    const PREFIX: &'static str = "CHG";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        if self.active {
            "active"
        } else {
            "inactive"
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl RunningChange {
    /// Create a new running change with required fields
    pub fn new(
        cn_number: impl Into<String>,
        title: impl Into<String>,
        estimated_go_live: NaiveDate,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Chg),
            cn_number: cn_number.into(),
            title: title.into(),
            description: None,
            owner: None,
            estimated_go_live,
            old_b_codes: Vec::new(),
            new_b_codes: Vec::new(),
            active: true,
            status_note: None,
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Whether this change replaces the given item code (exact match)
    pub fn replaces(&self, item_code: &str) -> bool {
        self.old_b_codes.iter().any(|c| c == item_code)
    }

    /// Deactivate the change (superseded changes stay on record)
    pub fn deactivate(&mut self, note: Option<String>) {
        self.active = false;
        if note.is_some() {
            self.status_note = note;
        }
        self.entity_revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_change_creation() {
        let chg = RunningChange::new("CN-0099", "Chainring swap", date(2025, 6, 1), "Author");
        assert!(chg.id.to_string().starts_with("CHG-"));
        assert_eq!(chg.cn_number, "CN-0099");
        assert!(chg.active);
        assert!(chg.old_b_codes.is_empty());
    }

    #[test]
    fn test_replaces_is_exact_match() {
        let mut chg = RunningChange::new("CN-0099", "Swap", date(2025, 6, 1), "Author");
        chg.old_b_codes = vec!["B100234".to_string()];

        assert!(chg.replaces("B100234"));
        assert!(!chg.replaces("b100234"));
        assert!(!chg.replaces("B10023"));
        assert!(!chg.replaces("B1002345"));
    }

    #[test]
    fn test_deactivate_keeps_record() {
        let mut chg = RunningChange::new("CN-0100", "Swap", date(2025, 6, 1), "Author");
        chg.deactivate(Some("superseded by CN-0112".to_string()));

        assert!(!chg.active);
        assert_eq!(chg.status_note.as_deref(), Some("superseded by CN-0112"));
        assert_eq!(chg.entity_revision, 2);
        assert_eq!(chg.status(), "inactive");
    }

    #[test]
    fn test_change_deserialization() {
        let yaml = r#"
id: CHG-01HC2JB7SMQX7RS1Y0GFKBHPTD
cn_number: "CN-0099"
title: "Chainring vendor swap"
owner: "M. Kranz"
estimated_go_live: 2025-06-01
old_b_codes:
  - "B100234"
new_b_codes:
  - "B100999"
active: true
status_note: "awaiting first article"
created: 2025-01-15T10:00:00Z
author: "J. Smith"
entity_revision: 1
"#;
        let chg: RunningChange = serde_yml::from_str(yaml).unwrap();
        assert_eq!(chg.cn_number, "CN-0099");
        assert_eq!(chg.estimated_go_live, date(2025, 6, 1));
        assert_eq!(chg.old_b_codes, vec!["B100234"]);
        assert_eq!(chg.new_b_codes, vec!["B100999"]);
        assert!(chg.replaces("B100234"));
    }

    #[test]
    fn test_active_defaults_to_true() {
        let yaml = r#"
id: CHG-01HC2JB7SMQX7RS1Y0GFKBHPTD
cn_number: "CN-0001"
title: "No active flag"
estimated_go_live: 2025-06-01
created: 2025-01-15T10:00:00Z
author: "J. Smith"
"#;
        let chg: RunningChange = serde_yml::from_str(yaml).unwrap();
        assert!(chg.active);
        assert_eq!(chg.entity_revision, 1);
    }
}
