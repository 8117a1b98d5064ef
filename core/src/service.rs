use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{aggregate, percentages_of_daily_value};
use crate::dataset::{self, FoodTable};
use crate::models::{
    DailyValuePercentages, PlateTotals, PreparedFood, ResolvedFood, validate_username,
};
use crate::resolver::{self, Unresolved};
use crate::store::{PlateStore, Retrieval};

/// Everything the charts need for one plate.
#[derive(Debug, Clone, Serialize)]
pub struct PlateReport {
    pub items: Vec<String>,
    pub resolved: BTreeMap<String, ResolvedFood>,
    pub unresolved: Vec<Unresolved>,
    pub totals: PlateTotals,
    pub percentages: DailyValuePercentages,
}

/// The prepared food table and the saved-plate store behind one handle.
///
/// The dataset is read on first use, so store-only operations never touch
/// the CSV files.
pub struct PlateService {
    dataset_dir: PathBuf,
    table: OnceCell<FoodTable>,
    store: PlateStore,
}

impl PlateService {
    pub fn open(dataset_dir: impl Into<PathBuf>, store_path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            dataset_dir: dataset_dir.into(),
            table: OnceCell::new(),
            store: PlateStore::open(store_path)?,
        })
    }

    #[must_use]
    pub fn with_table(table: FoodTable, store: PlateStore) -> Self {
        Self {
            dataset_dir: PathBuf::new(),
            table: OnceCell::from(table),
            store,
        }
    }

    /// The prepared table, loading the dataset if it has not been read yet.
    pub fn table(&self) -> Result<&FoodTable> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        debug!(dataset = %self.dataset_dir.display(), "loading dataset");
        let table = dataset::load_dir(&self.dataset_dir)?;
        Ok(self.table.get_or_init(|| table))
    }

    #[must_use]
    pub fn store(&self) -> &PlateStore {
        &self.store
    }

    /// Resolve, total and score a plate against the daily values.
    pub fn analyze(&self, items: &[String]) -> Result<PlateReport> {
        let resolution = resolver::resolve(items, self.table()?);
        let totals = aggregate(items, &resolution.resolved);
        let percentages = percentages_of_daily_value(&totals);
        Ok(PlateReport {
            items: items.to_vec(),
            resolved: resolution.resolved,
            unresolved: resolution.unresolved,
            totals,
            percentages,
        })
    }

    pub fn search(&self, query: &str) -> Result<Vec<&PreparedFood>> {
        Ok(resolver::search(query, self.table()?))
    }

    /// Save `items` for `username`, returning the trimmed username.
    pub fn save_plate(&self, username: &str, password: &str, items: &[String]) -> Result<String> {
        let username = validate_username(username)?;
        self.store.save(&username, password, items)?;
        Ok(username)
    }

    pub fn load_plate(&self, username: &str, password: &str) -> Result<Retrieval> {
        let username = validate_username(username)?;
        self.store.retrieve(&username, password)
    }

    pub fn list_users(&self) -> Result<Vec<String>> {
        self.store.list_users()
    }
}
