//! BOM item entity - a single line in the bill of materials

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};

/// Where an item's cost figures came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum CostSource {
    /// Priced from a current vendor contract
    Contract,
    /// Engineering estimate
    Estimate,
    /// Entered by hand
    #[default]
    Manual,
    /// Carried over from a CSV import
    Import,
}

impl std::fmt::Display for CostSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostSource::Contract => write!(f, "contract"),
            CostSource::Estimate => write!(f, "estimate"),
            CostSource::Manual => write!(f, "manual"),
            CostSource::Import => write!(f, "import"),
        }
    }
}

impl std::str::FromStr for CostSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contract" => Ok(CostSource::Contract),
            "estimate" | "est" => Ok(CostSource::Estimate),
            "manual" => Ok(CostSource::Manual),
            "import" => Ok(CostSource::Import),
            _ => Err(format!(
                "Invalid cost source: {}. Use contract, estimate, manual, or import",
                s
            )),
        }
    }
}

/// Check whether a string looks like a B-code part number (e.g. "B100234")
///
/// B-codes are a 'B' followed by digits. Matching elsewhere is exact-string;
/// this is only used to warn at the import boundary.
pub fn is_valid_b_code(code: &str) -> bool {
    let mut chars = code.chars();
    matches!(chars.next(), Some('B')) && {
        let rest: Vec<char> = chars.collect();
        !rest.is_empty() && rest.iter().all(|c| c.is_ascii_digit())
    }
}

/// A single BOM line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomItem {
    /// Unique identifier (ITEM-...)
    pub id: EntityId,

    /// Part number (B-code) - the key the running-change matcher joins on
    pub item_code: String,

    /// Item description
    pub description: String,

    /// Assembly/group code this line belongs to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group_code: String,

    /// Quantity per product unit
    pub quantity: f64,

    /// Tree depth in the BOM hierarchy (0 = top level)
    #[serde(default)]
    pub level: u32,

    /// Material cost per unit
    #[serde(default)]
    pub material_cost: f64,

    /// Landing (freight/duty) cost per unit
    #[serde(default)]
    pub landing_cost: f64,

    /// Labour cost per unit
    #[serde(default)]
    pub labour_cost: f64,

    /// Where the cost figures came from
    #[serde(default)]
    pub cost_source: CostSource,

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

impl Entity for BomItem {
    const PREFIX: &'static str = "ITEM";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.description
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

impl BomItem {
    /// Create a new BOM item with required fields
    pub fn new(
        item_code: impl Into<String>,
        description: impl Into<String>,
        quantity: f64,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Item),
            item_code: item_code.into(),
            description: description.into(),
            group_code: String::new(),
            quantity,
            level: 0,
            material_cost: 0.0,
            landing_cost: 0.0,
            labour_cost: 0.0,
            cost_source: CostSource::default(),
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Unit cost: material + landing + labour
    pub fn unit_cost(&self) -> f64 {
        self.material_cost + self.landing_cost + self.labour_cost
    }

    /// Extended cost: unit cost x quantity (derived, never stored)
    pub fn extended_cost(&self) -> f64 {
        self.unit_cost() * self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_creation() {
        let item = BomItem::new("B100234", "Chainring 42T", 2.0, "Test Author");
        assert!(item.id.to_string().starts_with("ITEM-"));
        assert_eq!(item.item_code, "B100234");
        assert_eq!(item.quantity, 2.0);
        assert_eq!(item.status, Status::Active);
        assert_eq!(item.cost_source, CostSource::Manual);
    }

    #[test]
    fn test_extended_cost_is_derived() {
        let mut item = BomItem::new("B100234", "Chainring 42T", 2.0, "Author");
        item.material_cost = 4.50;
        item.landing_cost = 0.30;
        item.labour_cost = 1.20;

        assert_eq!(item.unit_cost(), 6.0);
        assert_eq!(item.extended_cost(), 12.0);

        // extended cost is never serialized
        let yaml = serde_yml::to_string(&item).unwrap();
        assert!(!yaml.contains("extended_cost"));
    }

    #[test]
    fn test_b_code_validation() {
        assert!(is_valid_b_code("B100234"));
        assert!(is_valid_b_code("B1"));
        assert!(!is_valid_b_code("b100234"));
        assert!(!is_valid_b_code("B"));
        assert!(!is_valid_b_code("B10X34"));
        assert!(!is_valid_b_code("100234"));
        assert!(!is_valid_b_code(""));
    }

    #[test]
    fn test_cost_source_parsing() {
        assert_eq!("contract".parse::<CostSource>().unwrap(), CostSource::Contract);
        assert_eq!("est".parse::<CostSource>().unwrap(), CostSource::Estimate);
        assert!("bogus".parse::<CostSource>().is_err());
    }

    #[test]
    fn test_item_roundtrip() {
        let mut item = BomItem::new("B200555", "Rear derailleur", 1.0, "Author");
        item.group_code = "DRIVETRAIN".to_string();
        item.level = 2;
        item.material_cost = 38.0;
        item.cost_source = CostSource::Contract;
        item.tags = vec!["drivetrain".to_string()];

        let yaml = serde_yml::to_string(&item).unwrap();
        let parsed: BomItem = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(parsed.item_code, "B200555");
        assert_eq!(parsed.group_code, "DRIVETRAIN");
        assert_eq!(parsed.level, 2);
        assert_eq!(parsed.cost_source, CostSource::Contract);
        assert_eq!(parsed.extended_cost(), 38.0);
    }
}
