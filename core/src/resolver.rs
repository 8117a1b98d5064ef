use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::dataset::FoodTable;
use crate::models::{PreparedFood, ResolvedFood};

/// Rows at or above this many calories are treated as data errors.
pub const CALORIE_CEILING: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// No row's description contains the item.
    NotFound,
    /// Matches exist but none has all four nutrient values.
    InsufficientData,
}

/// A plate item that could not be matched to a dataset row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unresolved {
    pub item: String,
    pub reason: UnresolvedReason,
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let item = &self.item;
        match self.reason {
            UnresolvedReason::NotFound => write!(f, "Food '{item}' not found in USDA data."),
            UnresolvedReason::InsufficientData => {
                write!(f, "Not enough nutrient info on '{item}', skipping.")
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    /// Plate item name → the row it resolved to.
    pub resolved: BTreeMap<String, ResolvedFood>,
    /// Items that did not resolve, in plate order.
    pub unresolved: Vec<Unresolved>,
}

impl Resolution {
    #[must_use]
    pub fn get(&self, item: &str) -> Option<&ResolvedFood> {
        self.resolved.get(item)
    }
}

fn matches(row: &PreparedFood, needle: &str) -> bool {
    row.food_description.to_lowercase().contains(needle)
}

/// Pick the dataset row for a single plate item.
///
/// Candidates are rows whose description contains `item` (case-insensitive)
/// with fewer than [`CALORIE_CEILING`] calories. Among candidates with all
/// four nutrients present, the lowest-calorie row wins; ties go to the
/// earliest row.
pub fn best_match(item: &str, table: &FoodTable) -> Result<ResolvedFood, UnresolvedReason> {
    let needle = item.to_lowercase();
    let candidates: Vec<&PreparedFood> = table
        .rows()
        .iter()
        .filter(|row| matches(row, &needle))
        .filter(|row| row.calories.is_some_and(|c| c < CALORIE_CEILING))
        .collect();

    if candidates.is_empty() {
        return Err(UnresolvedReason::NotFound);
    }

    let mut best: Option<ResolvedFood> = None;
    for food in candidates.iter().filter_map(|row| row.to_resolved()) {
        if best.as_ref().is_none_or(|b| food.calories < b.calories) {
            best = Some(food);
        }
    }
    best.ok_or(UnresolvedReason::InsufficientData)
}

/// Resolve every plate item against the prepared table.
///
/// Items that fail to resolve are reported in [`Resolution::unresolved`] and
/// never abort the rest of the plate. A name repeated in the plate is
/// resolved once.
pub fn resolve<S: AsRef<str>>(plate: &[S], table: &FoodTable) -> Resolution {
    let mut resolution = Resolution::default();
    let mut seen: HashSet<&str> = HashSet::new();

    for item in plate {
        let item = item.as_ref();
        if !seen.insert(item) {
            continue;
        }
        match best_match(item, table) {
            Ok(food) => {
                debug!(
                    item,
                    fdc_id = food.fdc_id,
                    description = %food.description,
                    "resolved plate item"
                );
                resolution.resolved.insert(item.to_string(), food);
            }
            Err(reason) => {
                debug!(item, ?reason, "plate item unresolved");
                resolution.unresolved.push(Unresolved {
                    item: item.to_string(),
                    reason,
                });
            }
        }
    }

    resolution
}

/// Every row whose description contains `query` (case-insensitive), in table order.
#[must_use]
pub fn search<'a>(query: &str, table: &'a FoodTable) -> Vec<&'a PreparedFood> {
    let needle = query.to_lowercase();
    table
        .rows()
        .iter()
        .filter(|row| matches(row, &needle))
        .collect()
}
