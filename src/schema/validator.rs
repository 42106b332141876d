//! Schema validation with per-field error reporting
//!
//! Malformed entity files are caught here - at the ingestion boundary -
//! so the matching and comparison engines only ever see well-formed input.

use jsonschema::{validator_for, Validator as JsonValidator};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::core::identity::EntityPrefix;
use crate::schema::registry::SchemaRegistry;

/// A single validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// JSON pointer into the document ("" for document-level issues)
    pub path: String,
    pub message: String,
}

/// Result of validating one file
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    fn success() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }

    fn failure(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: false,
            issues,
        }
    }
}

/// Schema validator with compiled schemas
pub struct Validator {
    compiled: HashMap<EntityPrefix, JsonValidator>,
}

impl Validator {
    /// Compile every embedded schema
    pub fn new() -> Self {
        let mut compiled = HashMap::new();

        for prefix in EntityPrefix::all() {
            if let Some(schema_str) = SchemaRegistry::get(*prefix) {
                if let Ok(schema_json) = serde_json::from_str::<JsonValue>(&schema_str) {
                    if let Ok(compiled_schema) = validator_for(&schema_json) {
                        compiled.insert(*prefix, compiled_schema);
                    }
                }
            }
        }

        Self { compiled }
    }

    /// Validate YAML content against the schema for the given entity type
    ///
    /// Reports every violation, not just the first.
    pub fn validate(&self, content: &str, prefix: EntityPrefix) -> ValidationResult {
        let yaml_value: serde_yml::Value = match serde_yml::from_str(content) {
            Ok(v) => v,
            Err(e) => {
                return ValidationResult::failure(vec![ValidationIssue {
                    path: String::new(),
                    message: format!("YAML parse error: {}", e),
                }]);
            }
        };

        let json_value: JsonValue = match serde_json::to_value(&yaml_value) {
            Ok(v) => v,
            Err(e) => {
                return ValidationResult::failure(vec![ValidationIssue {
                    path: String::new(),
                    message: format!("failed to convert YAML to JSON: {}", e),
                }]);
            }
        };

        let Some(schema) = self.compiled.get(&prefix) else {
            // No schema compiled for this type - validation passes
            return ValidationResult::success();
        };

        let issues: Vec<ValidationIssue> = schema
            .iter_errors(&json_value)
            .map(|error| {
                let path = if error.instance_path.as_str().is_empty() {
                    String::new()
                } else {
                    error.instance_path.to_string()
                };
                ValidationIssue {
                    path,
                    message: error.to_string(),
                }
            })
            .collect();

        if issues.is_empty() {
            ValidationResult::success()
        } else {
            ValidationResult::failure(issues)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
