//! Assembly entity - template groups that BOM lines belong to

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};

/// Assembly / template group
///
/// Groups own no items; BOM lines reference a group by `group_code`.
/// Template groups are the targets the spec mapping engine resolves
/// spec options into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assembly {
    /// Unique identifier (ASM-...)
    pub id: EntityId,

    /// Group code (e.g. "DRIVETRAIN", "FRAME-CARBON")
    pub group_code: String,

    /// Group title/name
    pub title: String,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parent group code if this is a sub-group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Whether this group is a reusable BOM template group
    #[serde(default)]
    pub template: bool,

    /// Classification tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author name
    pub author: String,

    /// Revision counter for entity updates
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Assembly {
    const PREFIX: &'static str = "ASM";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        match self.status {
            Status::Draft => "draft",
            Status::Active => "active",
            Status::Obsolete => "obsolete",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Assembly {
    /// Create a new assembly group with required fields
    pub fn new(
        group_code: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Asm),
            group_code: group_code.into(),
            title: title.into(),
            description: None,
            parent: None,
            template: false,
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Create a template group (mapping target)
    pub fn template(
        group_code: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        let mut asm = Self::new(group_code, title, author);
        asm.template = true;
        asm
    }

    /// Mark the group obsolete (groups are retired, not deleted)
    pub fn retire(&mut self) {
        self.status = Status::Obsolete;
        self.entity_revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembly_creation() {
        let asm = Assembly::new("DRIVETRAIN", "Drivetrain group", "Test Author");
        assert!(asm.id.to_string().starts_with("ASM-"));
        assert_eq!(asm.group_code, "DRIVETRAIN");
        assert_eq!(asm.status, Status::Active);
        assert!(!asm.template);
    }

    #[test]
    fn test_template_constructor() {
        let asm = Assembly::template("FRAME-CARBON", "Carbon frame template", "Author");
        assert!(asm.template);
    }

    #[test]
    fn test_retire_bumps_revision() {
        let mut asm = Assembly::new("WHEELS", "Wheelset", "Author");
        asm.retire();
        assert_eq!(asm.status, Status::Obsolete);
        assert_eq!(asm.entity_revision, 2);
    }

    #[test]
    fn test_assembly_roundtrip() {
        let mut asm = Assembly::template("FRAME-CARBON", "Carbon frame template", "Author");
        asm.description = Some("All carbon frame variants".to_string());
        asm.parent = Some("FRAME".to_string());
        asm.tags = vec!["frame".to_string()];

        let yaml = serde_yml::to_string(&asm).unwrap();
        let parsed: Assembly = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(parsed.group_code, "FRAME-CARBON");
        assert_eq!(parsed.parent.as_deref(), Some("FRAME"));
        assert!(parsed.template);
    }
}
