use std::collections::BTreeMap;

use crate::models::{DailyValuePercentages, Nutrient, PlateTotals, ResolvedFood};

/// Sum the nutrients of every resolved plate item.
///
/// Items are visited in plate order, so food groups are counted in the
/// order they first appear. Items missing from `resolved` add nothing; a
/// repeated item counts once per occurrence.
pub fn aggregate<S: AsRef<str>>(
    plate: &[S],
    resolved: &BTreeMap<String, ResolvedFood>,
) -> PlateTotals {
    let mut totals = PlateTotals::default();
    for item in plate {
        if let Some(food) = resolved.get(item.as_ref()) {
            totals.add(food);
        }
    }
    totals
}

/// Percentage of the recommended daily value, capped at 100.
#[must_use]
pub fn daily_value_percentage(nutrient: Nutrient, total: f64) -> f64 {
    (total / nutrient.daily_value() * 100.0).min(100.0)
}

#[must_use]
pub fn percentages_of_daily_value(totals: &PlateTotals) -> DailyValuePercentages {
    let pct = |n: Nutrient| daily_value_percentage(n, totals.amount(n));
    DailyValuePercentages {
        calories: pct(Nutrient::Calories),
        protein: pct(Nutrient::Protein),
        carbs: pct(Nutrient::Carbohydrates),
        fat: pct(Nutrient::Fat),
    }
}
