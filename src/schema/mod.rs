//! Schema system - entity validation against embedded JSON Schemas

pub mod registry;
pub mod validator;

pub use registry::SchemaRegistry;
pub use validator::{ValidationIssue, ValidationResult, Validator};
