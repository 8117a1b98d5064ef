use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use plate_core::models::PreparedFood;
use plate_core::service::PlateReport;

/// Turn command-line food arguments into a plate, one item per argument.
///
/// Commas are part of the name, as in USDA descriptions like
/// "Apples, fuji, with skin, raw".
pub(crate) fn parse_plate(args: &[String]) -> Result<Vec<String>> {
    if args.is_empty() {
        bail!("A plate needs at least one food");
    }
    args.iter()
        .map(|arg| {
            let item = arg.trim();
            if item.is_empty() {
                bail!("Food names cannot be empty");
            }
            Ok(item.to_string())
        })
        .collect()
}

fn fmt_amount(value: Option<f64>) -> String {
    value.map_or("-".into(), |v| format!("{v:.1}"))
}

pub(crate) fn print_food_table(foods: &[&PreparedFood]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "FDC ID")]
        fdc_id: i64,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein (g)")]
        protein: String,
        #[tabled(rename = "Carbs (g)")]
        carbs: String,
        #[tabled(rename = "Fat (g)")]
        fat: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            fdc_id: f.fdc_id,
            description: truncate(&f.food_description, 45),
            category: truncate(&f.food_category, 25),
            calories: f.calories.map_or("-".into(), |v| format!("{v:.0}")),
            protein: fmt_amount(f.protein_g),
            carbs: fmt_amount(f.carbs_g),
            fat: fmt_amount(f.fat_g),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..8)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Table of plate items and the dataset rows they resolved to, in plate order.
pub(crate) fn print_plate_table(report: &PlateReport) {
    #[derive(Tabled)]
    struct PlateRow {
        #[tabled(rename = "Item")]
        item: String,
        #[tabled(rename = "Matched Food")]
        matched: String,
        #[tabled(rename = "Food Group")]
        group: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fat: String,
    }

    let rows: Vec<PlateRow> = report
        .items
        .iter()
        .filter_map(|item| report.resolved.get(item).map(|food| (item, food)))
        .map(|(item, food)| PlateRow {
            item: truncate(item, 25),
            matched: truncate(&food.description, 40),
            group: truncate(&food.group, 25),
            calories: format!("{:.0}", food.calories),
            protein: format!("{:.1}g", food.protein),
            carbs: format!("{:.1}g", food.carbs),
            fat: format!("{:.1}g", food.fats),
        })
        .collect();

    if rows.is_empty() {
        return;
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn totals_line(report: &PlateReport) -> String {
    let t = &report.totals;
    let (cal, p, c, f) = (t.calories, t.protein, t.carbs, t.fats);
    format!("TOTAL: {cal:.0} kcal | P:{p:.1}g C:{c:.1}g F:{f:.1}g")
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
