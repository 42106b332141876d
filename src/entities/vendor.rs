//! Vendor entity - approved vendors with contact info and lead times

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};

/// Approved vendor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    /// Unique identifier (VND-...)
    pub id: EntityId,

    /// Short name used by contract prices (e.g. "acme")
    pub short_name: String,

    /// Full vendor name
    pub title: String,

    /// Website URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,

    /// Contact phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,

    /// Typical lead time in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<u32>,

    /// Certifications held (e.g. "ISO 9001")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certifications: Vec<String>,

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

impl Entity for Vendor {
    const PREFIX: &'static str = "VND";

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

impl Vendor {
    /// Create a new vendor with required fields
    pub fn new(
        short_name: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Vnd),
            short_name: short_name.into(),
            title: title.into(),
            website: None,
            contact_email: None,
            contact_phone: None,
            lead_time_days: None,
            certifications: Vec::new(),
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }
}
