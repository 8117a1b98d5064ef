use anyhow::{Result, bail};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// The four nutrients a plate is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Calories,
    Protein,
    Carbohydrates,
    Fat,
}

pub const NUTRIENTS: [Nutrient; 4] = [
    Nutrient::Calories,
    Nutrient::Protein,
    Nutrient::Carbohydrates,
    Nutrient::Fat,
];

impl Nutrient {
    /// Name used for this nutrient in the USDA `nutrient.csv` table.
    #[must_use]
    pub fn source_name(self) -> &'static str {
        match self {
            Nutrient::Calories => "Energy",
            Nutrient::Protein => "Protein",
            Nutrient::Carbohydrates => "Carbohydrate, by difference",
            Nutrient::Fat => "Total lipid (fat)",
        }
    }

    #[must_use]
    pub fn from_source_name(name: &str) -> Option<Self> {
        NUTRIENTS.into_iter().find(|n| n.source_name() == name)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Nutrient::Calories => "Calories",
            Nutrient::Protein => "Protein (g)",
            Nutrient::Carbohydrates => "Carbohydrates (g)",
            Nutrient::Fat => "Fat (g)",
        }
    }

    /// FDA recommended daily value.
    #[must_use]
    pub fn daily_value(self) -> f64 {
        match self {
            Nutrient::Calories => 2000.0,
            Nutrient::Protein => 50.0,
            Nutrient::Carbohydrates => 275.0,
            Nutrient::Fat => 78.0,
        }
    }
}

// --- Raw USDA tables ---

/// A row of `food.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFood {
    pub fdc_id: i64,
    pub description: String,
    pub food_category_id: Option<i64>,
}

/// A row of `food_nutrient.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNutrientMeasurement {
    pub fdc_id: i64,
    pub nutrient_id: i64,
    pub amount: Option<f64>,
}

/// A row of `nutrient.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct NutrientType {
    pub id: i64,
    pub name: String,
}

/// A row of `food_category.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodCategory {
    pub id: i64,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub foods: Vec<RawFood>,
    pub measurements: Vec<RawNutrientMeasurement>,
    pub nutrients: Vec<NutrientType>,
    pub categories: Vec<FoodCategory>,
}

// --- Prepared table ---

/// One food of the prepared table. Nutrient amounts stay `None` when the
/// dataset has no measurement for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedFood {
    pub fdc_id: i64,
    pub food_description: String,
    pub food_category: String,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

impl PreparedFood {
    #[must_use]
    pub fn new(fdc_id: i64, food_description: &str, food_category: &str) -> Self {
        Self {
            fdc_id,
            food_description: food_description.to_string(),
            food_category: food_category.to_string(),
            calories: None,
            protein_g: None,
            carbs_g: None,
            fat_g: None,
        }
    }

    #[must_use]
    pub fn amount(&self, nutrient: Nutrient) -> Option<f64> {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein_g,
            Nutrient::Carbohydrates => self.carbs_g,
            Nutrient::Fat => self.fat_g,
        }
    }

    /// Record `value` unless the nutrient already has one; the first
    /// measurement encountered wins.
    pub fn fill(&mut self, nutrient: Nutrient, value: f64) {
        let slot = match nutrient {
            Nutrient::Calories => &mut self.calories,
            Nutrient::Protein => &mut self.protein_g,
            Nutrient::Carbohydrates => &mut self.carbs_g,
            Nutrient::Fat => &mut self.fat_g,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    #[must_use]
    pub fn has_any_nutrient(&self) -> bool {
        NUTRIENTS.iter().any(|n| self.amount(*n).is_some())
    }

    /// Convert to a resolved food, or `None` if any of the four amounts is missing.
    #[must_use]
    pub fn to_resolved(&self) -> Option<ResolvedFood> {
        Some(ResolvedFood {
            fdc_id: self.fdc_id,
            description: self.food_description.clone(),
            calories: self.calories?,
            protein: self.protein_g?,
            carbs: self.carbs_g?,
            fats: self.fat_g?,
            group: self.food_category.clone(),
        })
    }
}

/// Nutrients of the dataset row a plate item resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFood {
    pub fdc_id: i64,
    pub description: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub group: String,
}

impl ResolvedFood {
    #[must_use]
    pub fn amount(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbohydrates => self.carbs,
            Nutrient::Fat => self.fats,
        }
    }
}

// --- Totals ---

/// Food group occurrence counts, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryCounts(Vec<(String, u32)>);

impl CategoryCounts {
    pub fn increment(&mut self, category: &str) {
        if let Some((_, count)) = self.0.iter_mut().find(|(name, _)| name == category) {
            *count += 1;
        } else {
            self.0.push((category.to_string(), 1));
        }
    }

    #[must_use]
    pub fn get(&self, category: &str) -> Option<u32> {
        self.0
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, count)| *count)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.0.iter().map(|(_, count)| count).sum()
    }
}

impl Serialize for CategoryCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlateTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub food_groups: CategoryCounts,
}

impl PlateTotals {
    pub fn add(&mut self, food: &ResolvedFood) {
        self.calories += food.calories;
        self.protein += food.protein;
        self.carbs += food.carbs;
        self.fats += food.fats;
        self.food_groups.increment(&food.group);
    }

    #[must_use]
    pub fn amount(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbohydrates => self.carbs,
            Nutrient::Fat => self.fats,
        }
    }
}

/// Share of the recommended daily value, each capped at 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DailyValuePercentages {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl DailyValuePercentages {
    #[must_use]
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbohydrates => self.carbs,
            Nutrient::Fat => self.fat,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (Nutrient, f64)> {
        let pct = *self;
        NUTRIENTS.into_iter().map(move |n| (n, pct.get(n)))
    }
}

// --- Persistence ---

/// A user's entry in the plate store file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlate {
    pub password: String,
    pub plate: Vec<String>,
}

pub fn validate_username(username: &str) -> Result<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        bail!("Username must not be empty");
    }
    Ok(trimmed.to_string())
}
