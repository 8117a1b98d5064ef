use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::StringRecord;
use tracing::debug;

use crate::models::{
    FoodCategory, Nutrient, NutrientType, PreparedFood, RawFood, RawNutrientMeasurement, RawTables,
};

pub const FOOD_FILE: &str = "food.csv";
pub const FOOD_NUTRIENT_FILE: &str = "food_nutrient.csv";
pub const NUTRIENT_FILE: &str = "nutrient.csv";
pub const FOOD_CATEGORY_FILE: &str = "food_category.csv";

/// The prepared table: one row per food, ordered by FDC id.
#[derive(Debug, Clone, Default)]
pub struct FoodTable {
    rows: Vec<PreparedFood>,
}

impl FoodTable {
    /// Build a table from rows that are already prepared. Source order is kept.
    #[must_use]
    pub fn from_rows(rows: Vec<PreparedFood>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[PreparedFood] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Find the first of `names` present in the header row (case-insensitive).
fn column(headers: &StringRecord, names: &[&str]) -> Result<usize> {
    names
        .iter()
        .find_map(|name| headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
        .with_context(|| format!("Missing required column: {}", names[0]))
}

fn parse_id(record: &StringRecord, idx: usize) -> Option<i64> {
    record.get(idx).and_then(|v| v.trim().parse::<i64>().ok())
}

fn parse_amount(record: &StringRecord, idx: usize) -> Option<f64> {
    record
        .get(idx)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_text(record: &StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or("").trim().to_string()
}

/// Parse `food.csv`. The identifier column is `fdc_id` in USDA exports; a
/// plain `id` header is accepted too.
pub fn parse_foods<R: Read>(reader: R) -> Result<Vec<RawFood>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
    let idx_id = column(&headers, &["fdc_id", "id"])?;
    let idx_desc = column(&headers, &["description"])?;
    let idx_cat = column(&headers, &["food_category_id"])?;

    let mut foods = Vec::new();
    for (line_num, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV row {}", line_num + 2))?;
        let Some(fdc_id) = parse_id(&record, idx_id) else {
            continue;
        };
        foods.push(RawFood {
            fdc_id,
            description: parse_text(&record, idx_desc),
            food_category_id: parse_id(&record, idx_cat),
        });
    }
    Ok(foods)
}

/// Parse `food_nutrient.csv`.
pub fn parse_measurements<R: Read>(reader: R) -> Result<Vec<RawNutrientMeasurement>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
    let idx_food = column(&headers, &["fdc_id"])?;
    let idx_nutrient = column(&headers, &["nutrient_id"])?;
    let idx_amount = column(&headers, &["amount"])?;

    let mut measurements = Vec::new();
    for (line_num, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV row {}", line_num + 2))?;
        let (Some(fdc_id), Some(nutrient_id)) =
            (parse_id(&record, idx_food), parse_id(&record, idx_nutrient))
        else {
            continue;
        };
        measurements.push(RawNutrientMeasurement {
            fdc_id,
            nutrient_id,
            amount: parse_amount(&record, idx_amount),
        });
    }
    Ok(measurements)
}

/// Parse `nutrient.csv`.
pub fn parse_nutrients<R: Read>(reader: R) -> Result<Vec<NutrientType>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
    let idx_id = column(&headers, &["id"])?;
    let idx_name = column(&headers, &["name"])?;

    let mut nutrients = Vec::new();
    for (line_num, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV row {}", line_num + 2))?;
        if let Some(id) = parse_id(&record, idx_id) {
            nutrients.push(NutrientType {
                id,
                name: parse_text(&record, idx_name),
            });
        }
    }
    Ok(nutrients)
}

/// Parse `food_category.csv`.
pub fn parse_categories<R: Read>(reader: R) -> Result<Vec<FoodCategory>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
    let idx_id = column(&headers, &["id"])?;
    let idx_desc = column(&headers, &["description"])?;

    let mut categories = Vec::new();
    for (line_num, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV row {}", line_num + 2))?;
        if let Some(id) = parse_id(&record, idx_id) {
            categories.push(FoodCategory {
                id,
                description: parse_text(&record, idx_desc),
            });
        }
    }
    Ok(categories)
}

fn read<T>(dir: &Path, name: &'static str, parse: fn(File) -> Result<T>) -> Result<T> {
    let path = dir.join(name);
    let file = File::open(&path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    parse(file).context(name)
}

/// Read the four USDA Foundation Foods CSV files from `dir`.
pub fn read_tables(dir: &Path) -> Result<RawTables> {
    let foods = read(dir, FOOD_FILE, parse_foods)?;
    let measurements = read(dir, FOOD_NUTRIENT_FILE, parse_measurements)?;
    let nutrients = read(dir, NUTRIENT_FILE, parse_nutrients)?;
    let categories = read(dir, FOOD_CATEGORY_FILE, parse_categories)?;

    debug!(
        foods = foods.len(),
        measurements = measurements.len(),
        nutrients = nutrients.len(),
        categories = categories.len(),
        "read USDA tables"
    );

    Ok(RawTables {
        foods,
        measurements,
        nutrients,
        categories,
    })
}

/// Read and prepare the dataset in `dir`.
pub fn load_dir(dir: &Path) -> Result<FoodTable> {
    let tables = read_tables(dir)?;
    Ok(prepare(&tables))
}

/// Join the raw tables and pivot them into one row per food.
///
/// Measurements are joined to nutrient names, foods to their measurements,
/// and foods to category names. Only the four tracked nutrients survive.
/// A food is dropped when its category is unknown or when none of the
/// tracked nutrients has an amount. Repeated measurements of the same
/// nutrient keep the first amount in source order.
#[must_use]
pub fn prepare(tables: &RawTables) -> FoodTable {
    let mut nutrient_names: HashMap<i64, &str> = HashMap::new();
    for n in &tables.nutrients {
        nutrient_names.entry(n.id).or_insert(n.name.as_str());
    }

    let mut categories: HashMap<i64, &str> = HashMap::new();
    for c in &tables.categories {
        categories.entry(c.id).or_insert(c.description.as_str());
    }

    // fdc_id -> tracked measurements in source order
    let mut by_food: HashMap<i64, Vec<(Nutrient, f64)>> = HashMap::new();
    for m in &tables.measurements {
        let Some(nutrient) = nutrient_names
            .get(&m.nutrient_id)
            .and_then(|name| Nutrient::from_source_name(name))
        else {
            continue;
        };
        let Some(amount) = m.amount else {
            continue;
        };
        by_food
            .entry(m.fdc_id)
            .or_default()
            .push((nutrient, amount));
    }

    let mut seen: HashSet<i64> = HashSet::new();
    let mut rows = Vec::new();
    for food in &tables.foods {
        if !seen.insert(food.fdc_id) {
            continue;
        }
        let Some(category) = food.food_category_id.and_then(|id| categories.get(&id)) else {
            continue;
        };
        let Some(measurements) = by_food.get(&food.fdc_id) else {
            continue;
        };

        let mut row = PreparedFood::new(food.fdc_id, &food.description, category);
        for &(nutrient, amount) in measurements {
            row.fill(nutrient, amount);
        }
        if row.has_any_nutrient() {
            rows.push(row);
        }
    }
    rows.sort_by_key(|r| r.fdc_id);

    debug!(foods = rows.len(), "prepared food table");
    FoodTable::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOOD_CSV: &str = "\
\"fdc_id\",\"data_type\",\"description\",\"food_category_id\",\"publication_date\"
\"321358\",\"foundation_food\",\"Hummus, commercial\",\"16\",\"2019-04-01\"
\"171688\",\"foundation_food\",\"Apples, fuji, with skin, raw\",\"9\",\"2019-04-01\"
\"100001\",\"foundation_food\",\"Mystery powder\",\"\",\"2019-04-01\"
\"100002\",\"foundation_food\",\"Salt, table\",\"2\",\"2019-04-01\"
";

    const FOOD_NUTRIENT_CSV: &str = "\
\"id\",\"fdc_id\",\"nutrient_id\",\"amount\"
\"1\",\"321358\",\"1008\",\"229\"
\"2\",\"321358\",\"1003\",\"7.35\"
\"3\",\"321358\",\"1005\",\"14.9\"
\"4\",\"321358\",\"1004\",\"17.1\"
\"5\",\"321358\",\"1079\",\"5.4\"
\"6\",\"171688\",\"1062\",\"264\"
\"7\",\"171688\",\"1008\",\"63\"
\"8\",\"171688\",\"1003\",\"0.15\"
\"9\",\"171688\",\"1005\",\"\"
\"10\",\"100001\",\"1008\",\"400\"
\"11\",\"100002\",\"1079\",\"0\"
";

    const NUTRIENT_CSV: &str = "\
\"id\",\"name\",\"unit_name\",\"nutrient_nbr\",\"rank\"
\"1003\",\"Protein\",\"G\",\"203\",\"600\"
\"1004\",\"Total lipid (fat)\",\"G\",\"204\",\"800\"
\"1005\",\"Carbohydrate, by difference\",\"G\",\"205\",\"1110\"
\"1008\",\"Energy\",\"KCAL\",\"208\",\"300\"
\"1062\",\"Energy\",\"kJ\",\"268\",\"400\"
\"1079\",\"Fiber, total dietary\",\"G\",\"291\",\"1200\"
";

    const FOOD_CATEGORY_CSV: &str = "\
\"id\",\"code\",\"description\"
\"2\",\"0200\",\"Spices and Herbs\"
\"9\",\"0900\",\"Fruits and Fruit Juices\"
\"16\",\"1600\",\"Legumes and Legume Products\"
";

    fn sample_tables() -> RawTables {
        RawTables {
            foods: parse_foods(FOOD_CSV.as_bytes()).unwrap(),
            measurements: parse_measurements(FOOD_NUTRIENT_CSV.as_bytes()).unwrap(),
            nutrients: parse_nutrients(NUTRIENT_CSV.as_bytes()).unwrap(),
            categories: parse_categories(FOOD_CATEGORY_CSV.as_bytes()).unwrap(),
        }
    }

    #[test]
    fn test_parse_foods() {
        let foods = parse_foods(FOOD_CSV.as_bytes()).unwrap();
        assert_eq!(foods.len(), 4);
        assert_eq!(foods[0].fdc_id, 321_358);
        assert_eq!(foods[0].description, "Hummus, commercial");
        assert_eq!(foods[0].food_category_id, Some(16));
        assert_eq!(foods[2].food_category_id, None);
    }

    #[test]
    fn test_parse_foods_accepts_plain_id_header() {
        let csv = "id,description,food_category_id\n5,Kale,11\n";
        let foods = parse_foods(csv.as_bytes()).unwrap();
        assert_eq!(foods[0].fdc_id, 5);
        assert_eq!(foods[0].description, "Kale");
    }

    #[test]
    fn test_parse_missing_required_column() {
        let csv = "fdc_id,nutrient_id\n1,1008\n";
        let err = parse_measurements(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("amount"));
    }

    #[test]
    fn test_parse_measurements_missing_amount() {
        let rows = parse_measurements(FOOD_NUTRIENT_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 11);
        assert_eq!(rows[8].amount, None);
        assert_eq!(rows[0].amount, Some(229.0));
    }

    #[test]
    fn test_parse_skips_rows_without_ids() {
        let csv = "id,name\n,Orphan\n1008,Energy\n";
        let nutrients = parse_nutrients(csv.as_bytes()).unwrap();
        assert_eq!(nutrients.len(), 1);
        assert_eq!(nutrients[0].name, "Energy");
    }

    #[test]
    fn test_prepare_pivots_tracked_nutrients() {
        let table = prepare(&sample_tables());
        assert_eq!(table.len(), 2);

        let hummus = table.rows().iter().find(|r| r.fdc_id == 321_358).unwrap();
        assert_eq!(hummus.food_description, "Hummus, commercial");
        assert_eq!(hummus.food_category, "Legumes and Legume Products");
        assert_eq!(hummus.calories, Some(229.0));
        assert_eq!(hummus.protein_g, Some(7.35));
        assert_eq!(hummus.carbs_g, Some(14.9));
        assert_eq!(hummus.fat_g, Some(17.1));
    }

    #[test]
    fn test_prepare_keeps_missing_values_missing() {
        let table = prepare(&sample_tables());
        let apple = table.rows().iter().find(|r| r.fdc_id == 171_688).unwrap();
        assert_eq!(apple.protein_g, Some(0.15));
        assert_eq!(apple.carbs_g, None);
        assert_eq!(apple.fat_g, None);
    }

    #[test]
    fn test_prepare_first_energy_measurement_wins() {
        // Both kJ and kcal rows are named "Energy"; the kJ row comes first.
        let table = prepare(&sample_tables());
        let apple = table.rows().iter().find(|r| r.fdc_id == 171_688).unwrap();
        assert_eq!(apple.calories, Some(264.0));
    }

    #[test]
    fn test_prepare_drops_uncategorized_and_untracked_foods() {
        let table = prepare(&sample_tables());
        assert!(table.rows().iter().all(|r| r.fdc_id != 100_001));
        assert!(table.rows().iter().all(|r| r.fdc_id != 100_002));
    }

    #[test]
    fn test_prepare_orders_by_fdc_id() {
        let table = prepare(&sample_tables());
        let ids: Vec<i64> = table.rows().iter().map(|r| r.fdc_id).collect();
        assert_eq!(ids, vec![171_688, 321_358]);
    }

    #[test]
    fn test_prepare_unique_food_ids() {
        let mut tables = sample_tables();
        tables.foods.push(tables.foods[0].clone());
        let table = prepare(&tables);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_prepare_ignores_unmatched_join_keys() {
        // An unknown nutrient id and a measurement for a food not in food.csv.
        let extra = "fdc_id,nutrient_id,amount\n321358,9999,42\n555555,1008,120\n";
        let mut tables = sample_tables();
        tables
            .measurements
            .extend(parse_measurements(extra.as_bytes()).unwrap());

        let table = prepare(&tables);
        let baseline = prepare(&sample_tables());
        assert_eq!(table.rows(), baseline.rows());
        assert!(table.rows().iter().all(|r| r.fdc_id != 555_555));
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [
            (FOOD_FILE, FOOD_CSV),
            (FOOD_NUTRIENT_FILE, FOOD_NUTRIENT_CSV),
            (NUTRIENT_FILE, NUTRIENT_CSV),
            (FOOD_CATEGORY_FILE, FOOD_CATEGORY_CSV),
        ] {
            std::fs::write(dir.path().join(name), body).unwrap();
        }

        let table = load_dir(dir.path()).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_load_dir_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FOOD_FILE), FOOD_CSV).unwrap();

        let err = load_dir(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains(FOOD_NUTRIENT_FILE));
    }
}
