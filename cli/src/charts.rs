use std::fmt::Write;

use colored::{Color, Colorize};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use plate_core::models::{CategoryCounts, DailyValuePercentages, Nutrient};

const BAR_WIDTH: usize = 40;
const GROUP_BAR_WIDTH: usize = 24;

fn nutrient_color(nutrient: Nutrient) -> Color {
    match nutrient {
        Nutrient::Calories => Color::TrueColor {
            r: 255,
            g: 182,
            b: 193,
        },
        Nutrient::Protein => Color::Green,
        Nutrient::Carbohydrates => Color::Cyan,
        Nutrient::Fat => Color::Yellow,
    }
}

/// A horizontal bar `width` cells wide, filled in proportion to `pct` (0-100).
#[allow(clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub(crate) fn bar(pct: f64, width: usize) -> String {
    let filled = ((pct.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Share of each food group on the plate.
pub(crate) fn food_group_chart(groups: &CategoryCounts) -> String {
    #[derive(Tabled)]
    struct GroupRow {
        #[tabled(rename = "Food Group")]
        group: String,
        #[tabled(rename = "Items")]
        items: u32,
        #[tabled(rename = "Share")]
        share: String,
        #[tabled(rename = "")]
        chart: String,
    }

    let title = "Food Group Distribution";
    if groups.is_empty() {
        return format!("{title}\n  No Food Groups Selected\n");
    }

    let total = f64::from(groups.total());
    let rows: Vec<GroupRow> = groups
        .entries()
        .map(|(group, count)| {
            let pct = f64::from(count) / total * 100.0;
            GroupRow {
                group: group.to_string(),
                items: count,
                share: format!("{pct:.1}%"),
                chart: bar(pct, GROUP_BAR_WIDTH),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
        .to_string();
    format!("{title}\n{table}\n")
}

/// The four daily value percentages as labelled bars.
pub(crate) fn daily_value_chart(pct: &DailyValuePercentages) -> String {
    let mut out = String::from("Nutritional Intake vs. Daily Recommended Values\n");
    for (nutrient, value) in pct.entries() {
        let label = nutrient.label();
        let cells = bar(value, BAR_WIDTH);
        let cells = cells.as_str().color(nutrient_color(nutrient));
        let _ = writeln!(out, "  {label:<18} {cells} {value:>5.1}%");
    }
    out
}
