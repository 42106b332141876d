//! Shared helper functions for CLI commands

use chrono::NaiveDate;
use miette::Result;

use crate::core::identity::EntityId;
use crate::core::project::Project;

/// Format an EntityId for display, truncating if too long
///
/// IDs longer than 16 characters are truncated to 13 chars with "..." suffix.
pub fn format_short_id(id: &EntityId) -> String {
    format_short_id_str(&id.to_string())
}

/// Format a string ID for display, truncating if too long
pub fn format_short_id_str(id: &str) -> String {
    if id.len() > 16 {
        format!("{}...", &id[..13])
    } else {
        id.to_string()
    }
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Parse a YYYY-MM-DD date argument
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| miette::miette!("invalid date '{}' (expected YYYY-MM-DD): {}", s, e))
}

/// Split a comma-separated code list argument, dropping empty segments
pub fn parse_code_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Resolve the project from the global --project override or by discovery
pub fn resolve_project(project_override: &Option<std::path::PathBuf>) -> Result<Project> {
    match project_override {
        Some(path) => Project::discover_from(path).map_err(|e| miette::miette!("{}", e)),
        None => Project::discover().map_err(|e| miette::miette!("{}", e)),
    }
}
