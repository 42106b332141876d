//! Contract price entity - vendor contract pricing with validity windows

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};

/// A vendor contract price for one item code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractPrice {
    /// Unique identifier (CTR-...)
    pub id: EntityId,

    /// Display title (e.g. "B100234 @ acme")
    pub title: String,

    /// Vendor short name
    pub vendor: String,

    /// Item code (B-code) this price applies to
    pub item_code: String,

    /// Currency code (e.g. "USD")
    pub currency: String,

    /// Contracted unit price
    pub unit_price: f64,

    /// Minimum order quantity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moq: Option<u32>,

    /// Lead time in days under this contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<u32>,

    /// Contract validity start (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,

    /// Contract validity end (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,

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

impl Entity for ContractPrice {
    const PREFIX: &'static str = "CTR";

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

impl ContractPrice {
    /// Create a new contract price with required fields
    pub fn new(
        vendor: impl Into<String>,
        item_code: impl Into<String>,
        currency: impl Into<String>,
        unit_price: f64,
        author: impl Into<String>,
    ) -> Self {
        let vendor = vendor.into();
        let item_code = item_code.into();
        Self {
            id: EntityId::new(EntityPrefix::Ctr),
            title: format!("{} @ {}", item_code, vendor),
            vendor,
            item_code,
            currency: currency.into(),
            unit_price,
            moq: None,
            lead_time_days: None,
            valid_from: None,
            valid_to: None,
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Whether the contract is in its validity window on the given date
    ///
    /// Open bounds are treated as unbounded on that side.
    pub fn is_current(&self, date: NaiveDate) -> bool {
        if self.status == Status::Obsolete {
            return false;
        }
        let from_ok = self.valid_from.map_or(true, |from| from <= date);
        let to_ok = self.valid_to.map_or(true, |to| date <= to);
        from_ok && to_ok
    }
}
