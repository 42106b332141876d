//! Running-change matcher
//!
//! Matches BOM items against active running changes by old B-code and
//! derives timing metadata per match. This is a Cartesian join on shared
//! code, not a tree traversal: BOM hierarchy is irrelevant, only the leaf
//! item code matters. Codes match case-sensitively and exactly.
//!
//! Pure functions over already-loaded collections; callers filter to
//! active changes before calling.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::entities::{BomItem, RunningChange};

const SECONDS_PER_DAY: i64 = 86_400;

/// A BOM item paired with a running change that replaces it
///
/// Derived on every read, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct AffectedItem {
    /// Item side
    pub item_code: String,
    pub description: String,
    pub group_code: String,
    pub quantity: f64,

    /// Change side
    pub cn_number: String,
    pub change_title: String,
    pub owner: Option<String>,
    pub estimated_go_live: NaiveDate,
    pub new_b_codes: Vec<String>,

    /// Whether the change is already live (go-live <= now)
    pub is_live: bool,

    /// Whole days until go-live; negative once live
    pub days_until_go_live: i64,

    /// Whether go-live falls after the project gate date. Informational
    /// only - false when no gate date is supplied.
    pub is_after_gate: bool,
}

/// Build an old-code -> change-index lookup
///
/// A change listing several old codes appears under each of them; a change
/// with an empty old-code list appears under none. A duplicated code inside
/// one change still yields a single entry.
fn build_code_index(changes: &[RunningChange]) -> HashMap<&str, Vec<usize>> {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, change) in changes.iter().enumerate() {
        for code in &change.old_b_codes {
            let entry = index.entry(code.as_str()).or_default();
            if !entry.contains(&idx) {
                entry.push(idx);
            }
        }
    }
    index
}

fn go_live_instant(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Find every (item, change) pair sharing an old B-code
///
/// Items keep their input order; per item, matches follow the order the
/// changes were supplied in. An item matched by several changes emits one
/// entry per change - nothing is silently dropped. Empty inputs yield an
/// empty result, not an error.
///
/// `gate_date` is the project's gate (e.g. DTx); when present, matches
/// whose go-live falls after it are flagged.
pub fn find_affected_items(
    items: &[BomItem],
    changes: &[RunningChange],
    now: DateTime<Utc>,
    gate_date: Option<NaiveDate>,
) -> Vec<AffectedItem> {
    let index = build_code_index(changes);
    let mut affected = Vec::new();

    for item in items {
        let Some(change_indices) = index.get(item.item_code.as_str()) else {
            continue;
        };
        for &idx in change_indices {
            let change = &changes[idx];
            let go_live = go_live_instant(change.estimated_go_live);
            let delta_seconds = (go_live - now).num_seconds();

            affected.push(AffectedItem {
                item_code: item.item_code.clone(),
                description: item.description.clone(),
                group_code: item.group_code.clone(),
                quantity: item.quantity,
                cn_number: change.cn_number.clone(),
                change_title: change.title.clone(),
                owner: change.owner.clone(),
                estimated_go_live: change.estimated_go_live,
                new_b_codes: change.new_b_codes.clone(),
                is_live: go_live <= now,
                days_until_go_live: delta_seconds.div_euclid(SECONDS_PER_DAY),
                is_after_gate: gate_date.map_or(false, |gate| change.estimated_go_live > gate),
            });
        }
    }

    affected
}

/// Count BOM items with at least one matching change
///
/// Cheap variant for badge rendering: counts items, not match pairs, and
/// classifies "has a match" exactly as [`find_affected_items`] does.
pub fn count_affected_items(items: &[BomItem], changes: &[RunningChange]) -> usize {
    let index = build_code_index(changes);
    items
        .iter()
        .filter(|item| index.contains_key(item.item_code.as_str()))
        .count()
}
