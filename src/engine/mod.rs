//! Engine module - pure data-transformation cores
//!
//! Two small engines sit above the CRUD plumbing: the running-change
//! matcher and the spec mapping/comparison engine. Both are synchronous
//! functions over already-loaded collections; all I/O happens at the
//! data-access boundary.

pub mod compare;
pub mod mapping;
pub mod matcher;

pub use compare::{
    apply_spec_changes, compare_specs, ApplyError, ApplyOptions, ApplyReport, BomImpact,
    CategoryTaxonomy, ChangeKind, ColourChange, CompareError, GroupStore, InMemoryGroupStore,
    SelectionChange, SpecComparison,
};
pub use mapping::{
    suggest_groups, ConfidenceBand, MappingIndex, MappingStore, MappingStoreError,
    SuggestedMapping, SuggestionSource, HEURISTIC_CONFIDENCE,
};
pub use matcher::{count_affected_items, find_affected_items, AffectedItem};
