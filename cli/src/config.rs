use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Directory holding the USDA Foundation Foods CSV export.
pub const DATASET_DIR_NAME: &str = "foundationfoodcsv";
pub const STORE_FILE_NAME: &str = "user_plates.json";

pub struct Config {
    pub data_dir: PathBuf,
    pub dataset_dir: PathBuf,
    pub store_path: PathBuf,
}

impl Config {
    /// Resolve paths, defaulting the data directory to the platform data dir.
    pub fn load(data_dir: Option<PathBuf>, dataset_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => ProjectDirs::from("", "", "plate")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Self::from_data_dir(data_dir, dataset_dir))
    }

    fn from_data_dir(data_dir: PathBuf, dataset_dir: Option<PathBuf>) -> Self {
        let dataset_dir = dataset_dir.unwrap_or_else(|| data_dir.join(DATASET_DIR_NAME));
        let store_path = data_dir.join(STORE_FILE_NAME);
        Config {
            data_dir,
            dataset_dir,
            store_path,
        }
    }
}
