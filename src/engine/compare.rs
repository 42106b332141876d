//! Spec comparison engine
//!
//! Diffs two frozen spec versions category-by-category, estimates the BOM
//! impact of each change through the mapping engine, and applies a
//! comparison to the template-group store on request. Comparisons are
//! computed on demand and never persisted.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::core::history::{HistoryError, SpecHistory};
use crate::engine::mapping::{suggest_groups, MappingIndex};
use crate::entities::{ColourSelection, Spec};

/// Fixed category ordering for deterministic reports
///
/// Changes are reported in this order regardless of selection insertion
/// order; categories the taxonomy does not know sort after known ones,
/// alphabetically.
#[derive(Debug, Clone)]
pub struct CategoryTaxonomy {
    order: Vec<String>,
}

impl Default for CategoryTaxonomy {
    fn default() -> Self {
        Self::new(
            [
                "Frame",
                "Frame Colour",
                "Fork",
                "Headset",
                "Groupset",
                "Brakes",
                "Wheels",
                "Tyres",
                "Handlebar",
                "Stem",
                "Seatpost",
                "Saddle",
                "Accessories",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
    }
}

impl CategoryTaxonomy {
    pub fn new(order: Vec<String>) -> Self {
        Self { order }
    }

    fn rank(&self, category: &str) -> Option<usize> {
        self.order.iter().position(|c| c == category)
    }

    /// Sort key: known categories by taxonomy position, unknown ones after,
    /// alphabetically
    fn sort_key<'a>(&self, category: &'a str) -> (usize, &'a str) {
        match self.rank(category) {
            Some(rank) => (rank, ""),
            None => (self.order.len(), category),
        }
    }
}

/// Kind of a diffed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// A category selection that differs between the two versions
#[derive(Debug, Clone, Serialize)]
pub struct SelectionChange {
    pub category: String,
    pub kind: ChangeKind,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// A colour sub-selection that differs, keyed by part name
#[derive(Debug, Clone, Serialize)]
pub struct ColourChange {
    pub part_name: String,
    pub kind: ChangeKind,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Estimated BOM impact of one selection change
#[derive(Debug, Clone, Serialize)]
pub struct BomImpact {
    pub category: String,
    pub option_value: String,
    pub groups_to_add: Vec<String>,
    pub groups_to_remove: Vec<String>,
    /// The changed option resolved to no template group: it can only be
    /// satisfied by creating a new part
    pub needs_new_part: bool,
    pub confidence: f64,
}

/// The diff between two spec versions
#[derive(Debug, Clone, Serialize)]
pub struct SpecComparison {
    pub from_version: u32,
    pub to_version: u32,
    pub bike_type: String,
    pub selection_changes: Vec<SelectionChange>,
    pub colour_changes: Vec<ColourChange>,
    pub impacts: Vec<BomImpact>,
}

impl SpecComparison {
    fn empty(from_version: u32, to_version: u32) -> Self {
        Self {
            from_version,
            to_version,
            bike_type: String::new(),
            selection_changes: Vec::new(),
            colour_changes: Vec::new(),
            impacts: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selection_changes.is_empty() && self.colour_changes.is_empty()
    }
}

/// Errors raised by the comparison engine
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("spec version {0} not found in history")]
    VersionNotFound(u32),

    #[error(transparent)]
    History(#[from] HistoryError),
}

fn format_colour(c: &ColourSelection) -> String {
    match &c.finish {
        Some(finish) => format!("{} ({})", c.colour, finish),
        None => c.colour.clone(),
    }
}

/// Compare two frozen spec versions
///
/// `from_version == to_version` short-circuits to an empty comparison
/// without touching the history store. Every selection change is resolved
/// through the mapping index into candidate groups to add/remove; options
/// with no resolution are flagged as requiring new-part creation.
pub fn compare_specs(
    history: &dyn SpecHistory,
    from_version: u32,
    to_version: u32,
    index: &MappingIndex,
    taxonomy: &CategoryTaxonomy,
) -> Result<SpecComparison, CompareError> {
    // Guard at the boundary, not inside the diff loop
    if from_version == to_version {
        return Ok(SpecComparison::empty(from_version, to_version));
    }

    let from = history
        .load_version(from_version)?
        .ok_or(CompareError::VersionNotFound(from_version))?;
    let to = history
        .load_version(to_version)?
        .ok_or(CompareError::VersionNotFound(to_version))?;

    let mut comparison = SpecComparison::empty(from_version, to_version);
    comparison.bike_type = to.bike_type.clone();

    diff_selections(&from, &to, taxonomy, &mut comparison);
    diff_colours(&from, &to, &mut comparison);
    resolve_impacts(&from, &to, index, &mut comparison);

    Ok(comparison)
}

fn diff_selections(
    from: &Spec,
    to: &Spec,
    taxonomy: &CategoryTaxonomy,
    comparison: &mut SpecComparison,
) {
    let from_by_cat: BTreeMap<&str, &str> = from
        .selections
        .iter()
        .map(|s| (s.category.as_str(), s.option_value.as_str()))
        .collect();
    let to_by_cat: BTreeMap<&str, &str> = to
        .selections
        .iter()
        .map(|s| (s.category.as_str(), s.option_value.as_str()))
        .collect();

    let mut changes = Vec::new();

    for (category, old_value) in &from_by_cat {
        match to_by_cat.get(category) {
            None => changes.push(SelectionChange {
                category: category.to_string(),
                kind: ChangeKind::Removed,
                old: Some(old_value.to_string()),
                new: None,
            }),
            Some(new_value) if new_value != old_value => changes.push(SelectionChange {
                category: category.to_string(),
                kind: ChangeKind::Modified,
                old: Some(old_value.to_string()),
                new: Some(new_value.to_string()),
            }),
            Some(_) => {}
        }
    }

    for (category, new_value) in &to_by_cat {
        if !from_by_cat.contains_key(category) {
            changes.push(SelectionChange {
                category: category.to_string(),
                kind: ChangeKind::Added,
                old: None,
                new: Some(new_value.to_string()),
            });
        }
    }

    changes.sort_by(|a, b| {
        taxonomy
            .sort_key(&a.category)
            .cmp(&taxonomy.sort_key(&b.category))
    });
    comparison.selection_changes = changes;
}

fn diff_colours(from: &Spec, to: &Spec, comparison: &mut SpecComparison) {
    let from_by_part: BTreeMap<&str, &ColourSelection> = from
        .colours
        .iter()
        .map(|c| (c.part_name.as_str(), c))
        .collect();
    let to_by_part: BTreeMap<&str, &ColourSelection> =
        to.colours.iter().map(|c| (c.part_name.as_str(), c)).collect();

    let mut changes = Vec::new();

    for (part, old) in &from_by_part {
        match to_by_part.get(part) {
            None => changes.push(ColourChange {
                part_name: part.to_string(),
                kind: ChangeKind::Removed,
                old: Some(format_colour(old)),
                new: None,
            }),
            Some(new) if new.colour != old.colour || new.finish != old.finish => {
                changes.push(ColourChange {
                    part_name: part.to_string(),
                    kind: ChangeKind::Modified,
                    old: Some(format_colour(old)),
                    new: Some(format_colour(new)),
                })
            }
            Some(_) => {}
        }
    }

    for (part, new) in &to_by_part {
        if !from_by_part.contains_key(part) {
            changes.push(ColourChange {
                part_name: part.to_string(),
                kind: ChangeKind::Added,
                old: None,
                new: Some(format_colour(new)),
            });
        }
    }

    changes.sort_by(|a, b| a.part_name.cmp(&b.part_name));
    comparison.colour_changes = changes;
}

fn resolve_impacts(from: &Spec, to: &Spec, index: &MappingIndex, comparison: &mut SpecComparison) {
    let mut impacts = Vec::new();

    for change in &comparison.selection_changes {
        let old_suggestion = change.old.as_deref().map(|old_value| {
            suggest_groups(
                index,
                &from.bike_type,
                &change.category,
                old_value,
                &from.selections,
            )
        });
        let old_groups = old_suggestion
            .as_ref()
            .map(|s| s.group_codes.clone())
            .unwrap_or_default();

        let (new_groups, needs_new_part, confidence) = match change.new.as_deref() {
            Some(new_value) => {
                let suggestion = suggest_groups(
                    index,
                    &to.bike_type,
                    &change.category,
                    new_value,
                    &to.selections,
                );
                let needs_new_part = suggestion.needs_manual_mapping();
                (suggestion.group_codes, needs_new_part, suggestion.confidence)
            }
            // pure removal: confidence is that of the outgoing resolution
            None => (
                Vec::new(),
                false,
                old_suggestion.as_ref().map_or(0.0, |s| s.confidence),
            ),
        };

        // groups present on both sides cancel out
        let groups_to_add: Vec<String> = new_groups
            .iter()
            .filter(|g| !old_groups.contains(g))
            .cloned()
            .collect();
        let groups_to_remove: Vec<String> = old_groups
            .iter()
            .filter(|g| !new_groups.contains(g))
            .cloned()
            .collect();

        impacts.push(BomImpact {
            category: change.category.clone(),
            option_value: change
                .new
                .clone()
                .or_else(|| change.old.clone())
                .unwrap_or_default(),
            groups_to_add,
            groups_to_remove,
            needs_new_part,
            confidence,
        });
    }

    comparison.impacts = impacts;
}

/// Which apply operations to run
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub add_groups: bool,
    pub remove_groups: bool,
    pub create_new_parts: bool,
}

impl ApplyOptions {
    fn any(&self) -> bool {
        self.add_groups || self.remove_groups || self.create_new_parts
    }
}

/// Outcome of applying a comparison
///
/// Sub-operations are best-effort and independently reported: a failed
/// group does not roll back the ones that succeeded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub success: bool,
    pub groups_added: Vec<String>,
    pub groups_removed: Vec<String>,
    /// Pre-checked no-ops (already present / already absent); re-running
    /// after a partial failure converges instead of erroring
    pub groups_skipped: Vec<String>,
    pub new_parts_created: usize,
    pub errors: Vec<String>,
}

/// Errors rejected before any write
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("no operation selected: enable add-groups, remove-groups, or create-new-parts")]
    NoOperationSelected,
}

/// Mutation seam to the template-group store
///
/// The CLI implements this over assembly YAML files; tests use an
/// in-memory store.
pub trait GroupStore {
    fn has_group(&self, code: &str) -> bool;
    fn add_group(&mut self, code: &str, source_option: &str) -> Result<(), String>;
    fn remove_group(&mut self, code: &str) -> Result<(), String>;
    /// Create a placeholder part/group for an unmapped option; returns the
    /// new group code
    fn create_part(&mut self, category: &str, option_value: &str) -> Result<String, String>;
}

/// Apply a comparison's BOM impacts to the group store
///
/// Validation (no operation selected) is rejected before any write.
/// Afterwards each sub-operation runs independently; failures are recorded
/// in the report and the rest continue.
pub fn apply_spec_changes(
    comparison: &SpecComparison,
    options: ApplyOptions,
    store: &mut dyn GroupStore,
) -> Result<ApplyReport, ApplyError> {
    if !options.any() {
        return Err(ApplyError::NoOperationSelected);
    }

    let mut report = ApplyReport::default();

    for impact in &comparison.impacts {
        if options.add_groups {
            for code in &impact.groups_to_add {
                if store.has_group(code) || report.groups_added.contains(code) {
                    report.groups_skipped.push(code.clone());
                    continue;
                }
                match store.add_group(code, &impact.option_value) {
                    Ok(()) => report.groups_added.push(code.clone()),
                    Err(e) => report.errors.push(format!("add {}: {}", code, e)),
                }
            }
        }

        if options.remove_groups {
            for code in &impact.groups_to_remove {
                if !store.has_group(code) {
                    report.groups_skipped.push(code.clone());
                    continue;
                }
                match store.remove_group(code) {
                    Ok(()) => report.groups_removed.push(code.clone()),
                    Err(e) => report.errors.push(format!("remove {}: {}", code, e)),
                }
            }
        }

        if options.create_new_parts && impact.needs_new_part {
            match store.create_part(&impact.category, &impact.option_value) {
                Ok(_code) => report.new_parts_created += 1,
                Err(e) => report
                    .errors
                    .push(format!("create part for {}: {}", impact.category, e)),
            }
        }
    }

    report.success = report.errors.is_empty();
    Ok(report)
}

/// In-memory group store for tests and previews
#[derive(Debug, Default)]
pub struct InMemoryGroupStore {
    pub groups: Vec<String>,
    pub parts: Vec<(String, String)>,
    /// Group codes whose mutations should fail (exercises partial success)
    pub fail_on: Vec<String>,
}

impl InMemoryGroupStore {
    pub fn with_groups(groups: &[&str]) -> Self {
        Self {
            groups: groups.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl GroupStore for InMemoryGroupStore {
    fn has_group(&self, code: &str) -> bool {
        self.groups.iter().any(|g| g == code)
    }

    fn add_group(&mut self, code: &str, _source_option: &str) -> Result<(), String> {
        if self.fail_on.iter().any(|f| f == code) {
            return Err("simulated failure".to_string());
        }
        self.groups.push(code.to_string());
        Ok(())
    }

    fn remove_group(&mut self, code: &str) -> Result<(), String> {
        if self.fail_on.iter().any(|f| f == code) {
            return Err("simulated failure".to_string());
        }
        self.groups.retain(|g| g != code);
        Ok(())
    }

    fn create_part(&mut self, category: &str, option_value: &str) -> Result<String, String> {
        let code = format!("NEW-{}", option_value.to_uppercase().replace(' ', "-"));
        self.parts.push((category.to_string(), option_value.to_string()));
        self.groups.push(code.clone());
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::InMemorySpecHistory;
    use crate::entities::mapping::SpecGroupMapping;
    use crate::entities::MappingKey;

    fn spec(version: u32, selections: &[(&str, &str)]) -> Spec {
        let mut s = Spec::new("MY26", "gravel", "Author");
        s.version = version;
        for (cat, opt) in selections {
            s.set_selection(*cat, *opt);
        }
        s
    }

    fn mapping(cat: &str, opt: &str, groups: &[&str]) -> SpecGroupMapping {
        SpecGroupMapping::confirmed(
            MappingKey::new("gravel", cat, opt),
            groups.iter().map(|s| s.to_string()).collect(),
            "tester",
        )
        .unwrap()
    }

    fn history_with(specs: Vec<Spec>) -> InMemorySpecHistory {
        let mut history = InMemorySpecHistory::new();
        for s in specs {
            history.insert(s);
        }
        history
    }

    #[test]
    fn test_same_version_short_circuits_without_reads() {
        let history = history_with(vec![spec(1, &[("Frame", "Carbon")])]);
        let index = MappingIndex::new();

        let comparison =
            compare_specs(&history, 1, 1, &index, &CategoryTaxonomy::default()).unwrap();

        assert!(comparison.is_empty());
        assert_eq!(history.read_count(), 0);
    }

    #[test]
    fn test_missing_version_is_typed_error() {
        let history = history_with(vec![spec(1, &[])]);
        let index = MappingIndex::new();

        let err =
            compare_specs(&history, 1, 9, &index, &CategoryTaxonomy::default()).unwrap_err();
        assert!(matches!(err, CompareError::VersionNotFound(9)));
    }

    #[test]
    fn test_modification_detected() {
        // v1 Frame=Aluminium, v2 Frame=Carbon: one modification, no add/remove
        let history = history_with(vec![
            spec(1, &[("Frame", "Aluminium")]),
            spec(2, &[("Frame", "Carbon")]),
        ]);
        let index = MappingIndex::new();

        let comparison =
            compare_specs(&history, 1, 2, &index, &CategoryTaxonomy::default()).unwrap();

        assert_eq!(comparison.selection_changes.len(), 1);
        let change = &comparison.selection_changes[0];
        assert_eq!(change.category, "Frame");
        assert_eq!(change.kind, ChangeKind::Modified);
        assert_eq!(change.old.as_deref(), Some("Aluminium"));
        assert_eq!(change.new.as_deref(), Some("Carbon"));

        assert!(!comparison
            .selection_changes
            .iter()
            .any(|c| c.kind != ChangeKind::Modified));
    }

    #[test]
    fn test_addition_and_removal_detected() {
        let history = history_with(vec![
            spec(1, &[("Frame", "Carbon"), ("Mudguards", "Alloy")]),
            spec(2, &[("Frame", "Carbon"), ("Saddle", "Race")]),
        ]);
        let index = MappingIndex::new();

        let comparison =
            compare_specs(&history, 1, 2, &index, &CategoryTaxonomy::default()).unwrap();

        assert_eq!(comparison.selection_changes.len(), 2);
        // Saddle is a known taxonomy category, Mudguards is not: Saddle first
        assert_eq!(comparison.selection_changes[0].category, "Saddle");
        assert_eq!(comparison.selection_changes[0].kind, ChangeKind::Added);
        assert_eq!(comparison.selection_changes[1].category, "Mudguards");
        assert_eq!(comparison.selection_changes[1].kind, ChangeKind::Removed);
    }

    #[test]
    fn test_ordering_is_deterministic_regardless_of_insertion() {
        let history = history_with(vec![
            spec(1, &[("Saddle", "Comfort"), ("Frame", "Aluminium"), ("Brakes", "Rim")]),
            spec(2, &[("Saddle", "Race"), ("Frame", "Carbon"), ("Brakes", "Disc")]),
        ]);
        let index = MappingIndex::new();

        let comparison =
            compare_specs(&history, 1, 2, &index, &CategoryTaxonomy::default()).unwrap();

        let categories: Vec<&str> = comparison
            .selection_changes
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        // taxonomy order, not insertion order
        assert_eq!(categories, vec!["Frame", "Brakes", "Saddle"]);
    }

    #[test]
    fn test_colour_diff_keyed_by_part_name() {
        let mut v1 = spec(1, &[]);
        v1.set_colour("Frame", "RAL 9005", Some("matte".to_string()));
        v1.set_colour("Fork", "RAL 9005", None);
        let mut v2 = spec(2, &[]);
        v2.set_colour("Frame", "RAL 3020", Some("matte".to_string()));
        v2.set_colour("Decals", "Silver", None);

        let history = history_with(vec![v1, v2]);
        let index = MappingIndex::new();

        let comparison =
            compare_specs(&history, 1, 2, &index, &CategoryTaxonomy::default()).unwrap();

        assert_eq!(comparison.colour_changes.len(), 3);
        // ordered by part name
        assert_eq!(comparison.colour_changes[0].part_name, "Decals");
        assert_eq!(comparison.colour_changes[0].kind, ChangeKind::Added);
        assert_eq!(comparison.colour_changes[1].part_name, "Fork");
        assert_eq!(comparison.colour_changes[1].kind, ChangeKind::Removed);
        assert_eq!(comparison.colour_changes[2].part_name, "Frame");
        assert_eq!(comparison.colour_changes[2].kind, ChangeKind::Modified);
        assert_eq!(
            comparison.colour_changes[2].old.as_deref(),
            Some("RAL 9005 (matte)")
        );
    }

    #[test]
    fn test_impacts_resolve_through_mappings() {
        let history = history_with(vec![
            spec(1, &[("Frame", "Aluminium")]),
            spec(2, &[("Frame", "Carbon")]),
        ]);
        let index = MappingIndex::from_mappings([
            mapping("Frame", "Aluminium", &["FRAME-ALU", "SEATCLAMP-STD"]),
            mapping("Frame", "Carbon", &["FRAME-CARBON", "SEATCLAMP-STD"]),
        ]);

        let comparison =
            compare_specs(&history, 1, 2, &index, &CategoryTaxonomy::default()).unwrap();

        assert_eq!(comparison.impacts.len(), 1);
        let impact = &comparison.impacts[0];
        // the shared group cancels out
        assert_eq!(impact.groups_to_add, vec!["FRAME-CARBON"]);
        assert_eq!(impact.groups_to_remove, vec!["FRAME-ALU"]);
        assert!(!impact.needs_new_part);
        assert_eq!(impact.confidence, 1.0);
    }

    #[test]
    fn test_unmapped_option_needs_new_part() {
        let history = history_with(vec![
            spec(1, &[]),
            spec(2, &[("Electronics", "Radar Light")]),
        ]);
        let index = MappingIndex::new();

        let comparison =
            compare_specs(&history, 1, 2, &index, &CategoryTaxonomy::default()).unwrap();

        let impact = &comparison.impacts[0];
        assert!(impact.groups_to_add.is_empty());
        assert!(impact.needs_new_part);
        assert_eq!(impact.confidence, 0.0);
    }

    #[test]
    fn test_removal_does_not_flag_new_part() {
        let history = history_with(vec![
            spec(1, &[("Mudguards", "Alloy")]),
            spec(2, &[]),
        ]);
        let index = MappingIndex::from_mappings([mapping("Mudguards", "Alloy", &["MUDGUARD-ALLOY"])]);

        let comparison =
            compare_specs(&history, 1, 2, &index, &CategoryTaxonomy::default()).unwrap();

        let impact = &comparison.impacts[0];
        assert_eq!(impact.groups_to_remove, vec!["MUDGUARD-ALLOY"]);
        assert!(impact.groups_to_add.is_empty());
        assert!(!impact.needs_new_part);
    }

    fn carbon_swap_comparison() -> SpecComparison {
        let history = history_with(vec![
            spec(1, &[("Frame", "Aluminium")]),
            spec(2, &[("Frame", "Carbon"), ("Electronics", "Radar Light")]),
        ]);
        let index = MappingIndex::from_mappings([
            mapping("Frame", "Aluminium", &["FRAME-ALU"]),
            mapping("Frame", "Carbon", &["FRAME-CARBON"]),
        ]);
        compare_specs(&history, 1, 2, &index, &CategoryTaxonomy::default()).unwrap()
    }

    #[test]
    fn test_apply_requires_an_operation() {
        let comparison = carbon_swap_comparison();
        let mut store = InMemoryGroupStore::default();

        let err =
            apply_spec_changes(&comparison, ApplyOptions::default(), &mut store).unwrap_err();
        assert!(matches!(err, ApplyError::NoOperationSelected));
        assert!(store.groups.is_empty());
    }

    #[test]
    fn test_apply_add_remove_and_create() {
        let comparison = carbon_swap_comparison();
        let mut store = InMemoryGroupStore::with_groups(&["FRAME-ALU"]);

        let report = apply_spec_changes(
            &comparison,
            ApplyOptions {
                add_groups: true,
                remove_groups: true,
                create_new_parts: true,
            },
            &mut store,
        )
        .unwrap();

        assert!(report.success);
        assert_eq!(report.groups_added, vec!["FRAME-CARBON"]);
        assert_eq!(report.groups_removed, vec!["FRAME-ALU"]);
        assert_eq!(report.new_parts_created, 1);
        assert!(store.has_group("FRAME-CARBON"));
        assert!(!store.has_group("FRAME-ALU"));
    }

    #[test]
    fn test_apply_is_idempotent_via_prechecks() {
        let comparison = carbon_swap_comparison();
        let mut store = InMemoryGroupStore::with_groups(&["FRAME-ALU"]);
        let options = ApplyOptions {
            add_groups: true,
            remove_groups: true,
            create_new_parts: false,
        };

        let first = apply_spec_changes(&comparison, options, &mut store).unwrap();
        assert_eq!(first.groups_added.len(), 1);
        assert_eq!(first.groups_removed.len(), 1);

        // re-run: everything pre-checked away, nothing duplicated
        let second = apply_spec_changes(&comparison, options, &mut store).unwrap();
        assert!(second.success);
        assert!(second.groups_added.is_empty());
        assert!(second.groups_removed.is_empty());
        assert_eq!(second.groups_skipped.len(), 2);
        assert_eq!(
            store.groups.iter().filter(|g| *g == "FRAME-CARBON").count(),
            1
        );
    }

    #[test]
    fn test_apply_partial_failure_still_reports_successes() {
        let comparison = carbon_swap_comparison();
        let mut store = InMemoryGroupStore::with_groups(&["FRAME-ALU"]);
        store.fail_on = vec!["FRAME-CARBON".to_string()];

        let report = apply_spec_changes(
            &comparison,
            ApplyOptions {
                add_groups: true,
                remove_groups: true,
                create_new_parts: false,
            },
            &mut store,
        )
        .unwrap();

        assert!(!report.success);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("FRAME-CARBON"));
        // the removal still happened - no rollback
        assert_eq!(report.groups_removed, vec!["FRAME-ALU"]);
        assert!(!store.has_group("FRAME-ALU"));
    }
}
