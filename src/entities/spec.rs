//! Spec entity - versioned category/option configuration documents
//!
//! Exactly one working spec exists per project. Edits before submission
//! mutate the draft in place; submission freezes a numbered copy into
//! `specs/history/` and later edits open the next version. Status
//! transitions are enforced by `core::workflow`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::workflow::{DecisionRecord, SpecStatus, SubmissionRecord};

/// A category -> selected option pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Category name (e.g. "Frame")
    pub category: String,

    /// Selected option value (e.g. "Carbon")
    pub option_value: String,
}

impl Selection {
    pub fn new(category: impl Into<String>, option_value: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            option_value: option_value.into(),
        }
    }
}

/// A colour/finish sub-selection keyed by part name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColourSelection {
    /// Part name (e.g. "Fork")
    pub part_name: String,

    /// Colour value (e.g. "RAL 9005")
    pub colour: String,

    /// Optional finish (e.g. "matte")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
}

/// Versioned product configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spec {
    /// Unique identifier (SPEC-...)
    pub id: EntityId,

    /// Spec title (e.g. "MY26 Gravel Pro")
    pub title: String,

    /// Bike type - first dimension of the mapping key
    pub bike_type: String,

    /// Version number, monotonically increasing across submissions
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workflow status
    #[serde(default)]
    pub status: SpecStatus,

    /// Ordered category -> option selections
    #[serde(default)]
    pub selections: Vec<Selection>,

    /// Colour/part sub-selections
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colours: Vec<ColourSelection>,

    /// Submission records (appended by the workflow, never removed)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submissions: Vec<SubmissionRecord>,

    /// Accept/reject decision records
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<DecisionRecord>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author name
    pub author: String,

    /// Revision counter for entity updates
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_version() -> u32 {
    1
}

fn default_revision() -> u32 {
    1
}

impl Entity for Spec {
    const PREFIX: &'static str = "SPEC";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        match self.status {
            SpecStatus::Draft => "draft",
            SpecStatus::Submitted => "submitted",
            SpecStatus::Accepted => "accepted",
            SpecStatus::Rejected => "rejected",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Spec {
    /// Create a new draft spec at version 1
    pub fn new(
        title: impl Into<String>,
        bike_type: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Spec),
            title: title.into(),
            bike_type: bike_type.into(),
            version: 1,
            status: SpecStatus::default(),
            selections: Vec::new(),
            colours: Vec::new(),
            submissions: Vec::new(),
            decisions: Vec::new(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Whether the working document may be edited in place
    pub fn is_editable(&self) -> bool {
        matches!(self.status, SpecStatus::Draft | SpecStatus::Rejected)
    }

    /// Look up the selected option for a category (exact match)
    pub fn selection(&self, category: &str) -> Option<&str> {
        self.selections
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.option_value.as_str())
    }

    /// Set (or replace) the selected option for a category
    pub fn set_selection(
        &mut self,
        category: impl Into<String>,
        option_value: impl Into<String>,
    ) {
        let category = category.into();
        let option_value = option_value.into();
        if let Some(existing) = self.selections.iter_mut().find(|s| s.category == category) {
            existing.option_value = option_value;
        } else {
            self.selections.push(Selection {
                category,
                option_value,
            });
        }
        self.entity_revision += 1;
    }

    /// Remove a category's selection; returns true if one was present
    pub fn remove_selection(&mut self, category: &str) -> bool {
        let before = self.selections.len();
        self.selections.retain(|s| s.category != category);
        let removed = self.selections.len() != before;
        if removed {
            self.entity_revision += 1;
        }
        removed
    }

    /// Look up a colour selection by part name
    pub fn colour(&self, part_name: &str) -> Option<&ColourSelection> {
        self.colours.iter().find(|c| c.part_name == part_name)
    }

    /// Set (or replace) a colour selection
    pub fn set_colour(
        &mut self,
        part_name: impl Into<String>,
        colour: impl Into<String>,
        finish: Option<String>,
    ) {
        let part_name = part_name.into();
        let colour = colour.into();
        if let Some(existing) = self.colours.iter_mut().find(|c| c.part_name == part_name) {
            existing.colour = colour;
            existing.finish = finish;
        } else {
            self.colours.push(ColourSelection {
                part_name,
                colour,
                finish,
            });
        }
        self.entity_revision += 1;
    }
}
