use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::models::StoredPlate;

/// Outcome of looking up a saved plate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    Plate(Vec<String>),
    WrongPassword,
    NotFound,
}

impl fmt::Display for Retrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retrieval::Plate(plate) => write!(f, "{}", plate.join(", ")),
            Retrieval::WrongPassword => write!(f, "Incorrect password."),
            Retrieval::NotFound => write!(f, "Username not found."),
        }
    }
}

/// Saved plates keyed by username, kept in a single JSON file.
///
/// Every save reads the whole file, replaces one entry and rewrites it.
/// There is no locking: two processes saving at once lose one update.
pub struct PlateStore {
    path: PathBuf,
}

impl PlateStore {
    /// Open the store at `path`, creating it as `{}` if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory: {}", parent.display())
                })?;
            }
            fs::write(&path, "{}")
                .with_context(|| format!("Failed to create plate store: {}", path.display()))?;
            debug!(path = %path.display(), "initialized plate store");
        }
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, StoredPlate>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read plate store: {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Malformed plate store: {}", self.path.display()))
    }

    fn write_all(&self, users: &BTreeMap<String, StoredPlate>) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        users.serialize(&mut ser)?;
        fs::write(&self.path, buf)
            .with_context(|| format!("Failed to write plate store: {}", self.path.display()))
    }

    /// Create or overwrite the entry for `username`.
    pub fn save(&self, username: &str, password: &str, plate: &[String]) -> Result<()> {
        let mut users = self.read_all()?;
        users.insert(
            username.to_string(),
            StoredPlate {
                password: password.to_string(),
                plate: plate.to_vec(),
            },
        );
        self.write_all(&users)?;
        debug!(username, items = plate.len(), "saved plate");
        Ok(())
    }

    /// Fetch the plate saved for `username` if `password` matches.
    pub fn retrieve(&self, username: &str, password: &str) -> Result<Retrieval> {
        let mut users = self.read_all()?;
        Ok(match users.remove(username) {
            None => Retrieval::NotFound,
            Some(stored) if stored.password == password => Retrieval::Plate(stored.plate),
            Some(_) => Retrieval::WrongPassword,
        })
    }

    /// Usernames with a saved plate, sorted.
    pub fn list_users(&self) -> Result<Vec<String>> {
        Ok(self.read_all()?.into_keys().collect())
    }
}
