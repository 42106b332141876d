//! Entity type definitions
//!
//! BCT manages the following entity types:
//!
//! **BOM Management:**
//! - [`BomItem`] - Individual BOM lines with quantities and cost components
//! - [`Assembly`] - Assembly / template groups that BOM lines belong to
//! - [`Vendor`] - Vendors with contact info and lead times
//! - [`ContractPrice`] - Vendor contract pricing with validity windows
//!
//! **Engineering Change:**
//! - [`RunningChange`] - In-flight part swaps (old B-codes -> new B-codes)
//!   with estimated go-live dates
//!
//! **Product Configuration:**
//! - [`Spec`] - Versioned category/option configuration documents
//! - [`SpecGroupMapping`] - Learned spec-option -> template-group mappings
//!   with confidence scores
//!
//! **Planning:**
//! - [`Task`] - Kanban board cards

pub mod assembly;
pub mod change;
pub mod contract;
pub mod item;
pub mod mapping;
pub mod spec;
pub mod task;
pub mod vendor;

pub use assembly::Assembly;
pub use change::RunningChange;
pub use contract::ContractPrice;
pub use item::{BomItem, CostSource};
pub use mapping::{MappingKey, SpecGroupMapping};
pub use spec::{ColourSelection, Selection, Spec};
pub use task::{Task, TaskColumn};
pub use vendor::Vendor;
