//! Spec workflow - status transitions and submission/decision records
//!
//! A spec moves draft -> submitted -> accepted | rejected. A rejected spec
//! returns to draft for revision; accepting a version freezes it and the
//! next edit opens a new draft version (handled by the spec store, not here).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Workflow status of a spec document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum SpecStatus {
    #[default]
    Draft,
    Submitted,
    Accepted,
    Rejected,
}

impl std::fmt::Display for SpecStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecStatus::Draft => write!(f, "draft"),
            SpecStatus::Submitted => write!(f, "submitted"),
            SpecStatus::Accepted => write!(f, "accepted"),
            SpecStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for SpecStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(SpecStatus::Draft),
            "submitted" => Ok(SpecStatus::Submitted),
            "accepted" => Ok(SpecStatus::Accepted),
            "rejected" => Ok(SpecStatus::Rejected),
            _ => Err(format!("Unknown spec status: {}", s)),
        }
    }
}

/// Errors that can occur during workflow operations
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: SpecStatus, to: SpecStatus },

    #[error("spec is not in {expected} status (current: {current})")]
    WrongStatus {
        expected: SpecStatus,
        current: SpecStatus,
    },

    #[error("failed to parse YAML: {message}")]
    YamlError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Check if a status transition is valid
pub fn is_valid_transition(from: SpecStatus, to: SpecStatus) -> bool {
    matches!(
        (from, to),
        (SpecStatus::Draft, SpecStatus::Submitted)
            | (SpecStatus::Submitted, SpecStatus::Accepted)
            | (SpecStatus::Submitted, SpecStatus::Rejected)
            | (SpecStatus::Rejected, SpecStatus::Draft)
    )
}

/// Get allowed transitions from the current status
pub fn allowed_transitions(current: SpecStatus) -> Vec<SpecStatus> {
    match current {
        SpecStatus::Draft => vec![SpecStatus::Submitted],
        SpecStatus::Submitted => vec![SpecStatus::Accepted, SpecStatus::Rejected],
        SpecStatus::Rejected => vec![SpecStatus::Draft],
        SpecStatus::Accepted => vec![],
    }
}

/// Validate a transition, returning a typed error when it is not allowed
pub fn check_transition(from: SpecStatus, to: SpecStatus) -> Result<(), WorkflowError> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition { from, to })
    }
}

/// Submission record stored in spec YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub submitted_by: String,
    pub timestamp: DateTime<Utc>,
    pub version: u32,
}

/// Decision record stored in spec YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decided_by: String,
    pub decision: SpecStatus,
    pub timestamp: DateTime<Utc>,
    pub comment: Option<String>,
}

/// Update a spec's status in its YAML file
pub fn update_spec_status(file_path: &Path, new_status: SpecStatus) -> Result<(), WorkflowError> {
    let contents = std::fs::read_to_string(file_path)?;

    // Parse as YAML value to preserve unrelated fields
    let mut doc: serde_yml::Value =
        serde_yml::from_str(&contents).map_err(|e| WorkflowError::YamlError {
            message: e.to_string(),
        })?;

    if let Some(map) = doc.as_mapping_mut() {
        map.insert(
            "status",
            serde_yml::Value::String(new_status.to_string()),
        );
    }

    let new_contents = serde_yml::to_string(&doc).map_err(|e| WorkflowError::YamlError {
        message: e.to_string(),
    })?;

    std::fs::write(file_path, new_contents)?;
    Ok(())
}

/// Record a submission in a spec's YAML file
pub fn record_submission(
    file_path: &Path,
    submitted_by: &str,
    version: u32,
) -> Result<(), WorkflowError> {
    append_record(file_path, SpecStatus::Submitted, "submissions", |record| {
        record.insert(
            "submitted_by",
            serde_yml::Value::String(submitted_by.to_string()),
        );
        record.insert(
            "version",
            serde_yml::Value::Number(version.into()),
        );
    })
}

/// Record an accept/reject decision in a spec's YAML file
pub fn record_decision(
    file_path: &Path,
    decision: SpecStatus,
    decided_by: &str,
    comment: Option<&str>,
) -> Result<(), WorkflowError> {
    append_record(file_path, decision, "decisions", |record| {
        record.insert(
            "decided_by",
            serde_yml::Value::String(decided_by.to_string()),
        );
        record.insert(
            "decision",
            serde_yml::Value::String(decision.to_string()),
        );
        if let Some(c) = comment {
            record.insert(
                "comment",
                serde_yml::Value::String(c.to_string()),
            );
        }
    })
}

fn append_record(
    file_path: &Path,
    new_status: SpecStatus,
    list_key: &str,
    fill: impl FnOnce(&mut serde_yml::Mapping),
) -> Result<(), WorkflowError> {
    let contents = std::fs::read_to_string(file_path)?;

    let mut doc: serde_yml::Value =
        serde_yml::from_str(&contents).map_err(|e| WorkflowError::YamlError {
            message: e.to_string(),
        })?;

    if let Some(map) = doc.as_mapping_mut() {
        map.insert(
            "status",
            serde_yml::Value::String(new_status.to_string()),
        );

        let mut record = serde_yml::Mapping::new();
        fill(&mut record);
        record.insert(
            "timestamp",
            serde_yml::Value::String(Utc::now().to_rfc3339()),
        );

        let list = map
            .entry(list_key.to_string())
            .or_insert_with(|| serde_yml::Value::Sequence(Vec::new()));

        if let Some(seq) = list.as_sequence_mut() {
            seq.push(serde_yml::Value::Mapping(record));
        }
    }

    let new_contents = serde_yml::to_string(&doc).map_err(|e| WorkflowError::YamlError {
        message: e.to_string(),
    })?;

    std::fs::write(file_path, new_contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_valid_transitions() {
        assert!(is_valid_transition(SpecStatus::Draft, SpecStatus::Submitted));
        assert!(is_valid_transition(
            SpecStatus::Submitted,
            SpecStatus::Accepted
        ));
        assert!(is_valid_transition(
            SpecStatus::Submitted,
            SpecStatus::Rejected
        ));
        assert!(is_valid_transition(SpecStatus::Rejected, SpecStatus::Draft));

        assert!(!is_valid_transition(SpecStatus::Draft, SpecStatus::Accepted));
        assert!(!is_valid_transition(
            SpecStatus::Accepted,
            SpecStatus::Draft
        ));
        assert!(!is_valid_transition(
            SpecStatus::Draft,
            SpecStatus::Rejected
        ));
    }

    #[test]
    fn test_allowed_transitions() {
        assert_eq!(
            allowed_transitions(SpecStatus::Draft),
            vec![SpecStatus::Submitted]
        );
        assert_eq!(
            allowed_transitions(SpecStatus::Submitted),
            vec![SpecStatus::Accepted, SpecStatus::Rejected]
        );
        assert_eq!(
            allowed_transitions(SpecStatus::Rejected),
            vec![SpecStatus::Draft]
        );
        assert!(allowed_transitions(SpecStatus::Accepted).is_empty());
    }

    #[test]
    fn test_check_transition_error() {
        let err = check_transition(SpecStatus::Draft, SpecStatus::Accepted).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_update_spec_status() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("spec.yaml");

        std::fs::write(
            &file,
            r#"id: SPEC-TEST
bike_type: gravel
status: draft
"#,
        )
        .unwrap();

        update_spec_status(&file, SpecStatus::Submitted).unwrap();

        let contents = std::fs::read_to_string(&file).unwrap();
        assert!(contents.contains("status: submitted"));
        assert!(contents.contains("bike_type: gravel"));
    }

    #[test]
    fn test_record_submission() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("spec.yaml");

        std::fs::write(
            &file,
            r#"id: SPEC-TEST
status: draft
"#,
        )
        .unwrap();

        record_submission(&file, "mkranz", 3).unwrap();

        let contents = std::fs::read_to_string(&file).unwrap();
        assert!(contents.contains("status: submitted"));
        assert!(contents.contains("submitted_by: mkranz"));
        assert!(contents.contains("version: 3"));
    }

    #[test]
    fn test_record_decision() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("spec.yaml");

        std::fs::write(
            &file,
            r#"id: SPEC-TEST
status: submitted
"#,
        )
        .unwrap();

        record_decision(&file, SpecStatus::Rejected, "avogel", Some("colour TBD")).unwrap();

        let contents = std::fs::read_to_string(&file).unwrap();
        assert!(contents.contains("status: rejected"));
        assert!(contents.contains("decided_by: avogel"));
        assert!(contents.contains("comment: colour TBD"));
    }
}
