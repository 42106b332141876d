//! Spec group mapping entity - learned spec-option to template-group links
//!
//! A mapping associates a (bike type, category, option value) triple with
//! one or more BOM template group codes. Confidence starts at an
//! unconfirmed default when auto-suggested and becomes 1.0 once a human
//! confirms the suggestion; the usage counter tracks confirmations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// Composite lookup key for a mapping (exact-match on all three parts)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappingKey {
    pub bike_type: String,
    pub category: String,
    pub option_value: String,
}

impl MappingKey {
    pub fn new(
        bike_type: impl Into<String>,
        category: impl Into<String>,
        option_value: impl Into<String>,
    ) -> Self {
        Self {
            bike_type: bike_type.into(),
            category: category.into(),
            option_value: option_value.into(),
        }
    }
}

impl std::fmt::Display for MappingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.bike_type, self.category, self.option_value)
    }
}

/// Errors raised by mapping mutations
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("confidence {0} out of bounds (must be within 0.0..=1.0)")]
    ConfidenceOutOfBounds(f64),

    #[error("group code list must not be empty")]
    EmptyGroupCodes,
}

/// Default confidence for a mapping seeded from a heuristic suggestion
pub const SUGGESTED_CONFIDENCE: f64 = 0.4;

/// Learned association between a spec option and BOM template groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecGroupMapping {
    /// Unique identifier (MAP-...)
    pub id: EntityId,

    /// Bike type dimension of the key
    pub bike_type: String,

    /// Category dimension of the key
    pub category: String,

    /// Option value dimension of the key
    pub option_value: String,

    /// Template group codes this option resolves to
    #[serde(default)]
    pub group_codes: Vec<String>,

    /// Confidence score in [0, 1]
    pub confidence: f64,

    /// Number of times a human confirmed this mapping
    #[serde(default)]
    pub usage_count: u32,

    /// Who last confirmed the mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<String>,

    /// When the mapping was last confirmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_confirmed: Option<DateTime<Utc>>,

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

impl Entity for SpecGroupMapping {
    const PREFIX: &'static str = "MAP";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.option_value
    }

    fn status(&self) -> &str {
        if self.confidence >= 1.0 {
            "confirmed"
        } else {
            "suggested"
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl SpecGroupMapping {
    /// Create an unconfirmed mapping seeded at the suggested confidence
    pub fn suggested(
        key: MappingKey,
        group_codes: Vec<String>,
        author: impl Into<String>,
    ) -> Result<Self, MappingError> {
        if group_codes.is_empty() {
            return Err(MappingError::EmptyGroupCodes);
        }
        Ok(Self {
            id: EntityId::new(EntityPrefix::Map),
            bike_type: key.bike_type,
            category: key.category,
            option_value: key.option_value,
            group_codes,
            confidence: SUGGESTED_CONFIDENCE,
            usage_count: 0,
            confirmed_by: None,
            last_confirmed: None,
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        })
    }

    /// Create a confirmed mapping at full confidence
    pub fn confirmed(
        key: MappingKey,
        group_codes: Vec<String>,
        user: impl Into<String>,
    ) -> Result<Self, MappingError> {
        let user = user.into();
        let mut mapping = Self::suggested(key, group_codes, user.clone())?;
        mapping.confirm(&user);
        // confirm() bumps the revision; a fresh record starts at 1
        mapping.entity_revision = 1;
        mapping.usage_count = 1;
        Ok(mapping)
    }

    /// The composite lookup key for this mapping
    pub fn key(&self) -> MappingKey {
        MappingKey::new(
            self.bike_type.clone(),
            self.category.clone(),
            self.option_value.clone(),
        )
    }

    /// Set confidence, rejecting out-of-bounds values
    pub fn set_confidence(&mut self, confidence: f64) -> Result<(), MappingError> {
        if !(0.0..=1.0).contains(&confidence) || confidence.is_nan() {
            return Err(MappingError::ConfidenceOutOfBounds(confidence));
        }
        self.confidence = confidence;
        Ok(())
    }

    /// Record a human confirmation: confidence 1.0, usage counter bumped
    pub fn confirm(&mut self, user: &str) {
        self.confidence = 1.0;
        self.usage_count += 1;
        self.confirmed_by = Some(user.to_string());
        self.last_confirmed = Some(Utc::now());
        self.entity_revision += 1;
    }

    /// Whether a human has confirmed this mapping
    pub fn is_confirmed(&self) -> bool {
        self.confidence >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> MappingKey {
        MappingKey::new("gravel", "Frame", "Carbon")
    }

    #[test]
    fn test_suggested_mapping_defaults() {
        let mapping =
            SpecGroupMapping::suggested(key(), vec!["FRAME-CARBON".to_string()], "Author").unwrap();
        assert_eq!(mapping.confidence, SUGGESTED_CONFIDENCE);
        assert_eq!(mapping.usage_count, 0);
        assert!(!mapping.is_confirmed());
        assert_eq!(mapping.status(), "suggested");
    }

    #[test]
    fn test_confirmed_mapping() {
        let mapping =
            SpecGroupMapping::confirmed(key(), vec!["FRAME-CARBON".to_string()], "mkranz").unwrap();
        assert_eq!(mapping.confidence, 1.0);
        assert_eq!(mapping.usage_count, 1);
        assert_eq!(mapping.confirmed_by.as_deref(), Some("mkranz"));
        assert_eq!(mapping.status(), "confirmed");
    }

    #[test]
    fn test_empty_group_codes_rejected() {
        let err = SpecGroupMapping::suggested(key(), vec![], "Author").unwrap_err();
        assert!(matches!(err, MappingError::EmptyGroupCodes));
    }

    #[test]
    fn test_confidence_bounds() {
        let mut mapping =
            SpecGroupMapping::suggested(key(), vec!["FRAME-CARBON".to_string()], "Author").unwrap();
        assert!(mapping.set_confidence(0.0).is_ok());
        assert!(mapping.set_confidence(1.0).is_ok());
        assert!(matches!(
            mapping.set_confidence(1.1),
            Err(MappingError::ConfidenceOutOfBounds(_))
        ));
        assert!(matches!(
            mapping.set_confidence(-0.1),
            Err(MappingError::ConfidenceOutOfBounds(_))
        ));
        assert!(mapping.set_confidence(f64::NAN).is_err());
    }

    #[test]
    fn test_confirm_bumps_usage() {
        let mut mapping =
            SpecGroupMapping::suggested(key(), vec!["FRAME-CARBON".to_string()], "Author").unwrap();
        mapping.confirm("mkranz");
        mapping.confirm("avogel");

        assert_eq!(mapping.confidence, 1.0);
        assert_eq!(mapping.usage_count, 2);
        assert_eq!(mapping.confirmed_by.as_deref(), Some("avogel"));
    }

    #[test]
    fn test_key_roundtrip() {
        let mapping =
            SpecGroupMapping::suggested(key(), vec!["FRAME-CARBON".to_string()], "Author").unwrap();
        assert_eq!(mapping.key(), key());
        assert_eq!(mapping.key().to_string(), "gravel/Frame/Carbon");
    }

    #[test]
    fn test_mapping_roundtrip() {
        let mapping = SpecGroupMapping::confirmed(
            key(),
            vec!["FRAME-CARBON".to_string(), "FORK-CARBON".to_string()],
            "mkranz",
        )
        .unwrap();

        let yaml = serde_yml::to_string(&mapping).unwrap();
        let parsed: SpecGroupMapping = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(parsed.key(), key());
        assert_eq!(parsed.group_codes.len(), 2);
        assert_eq!(parsed.confidence, 1.0);
    }
}
