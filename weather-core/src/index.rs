//! The persisted province/city index.
//!
//! On disk it is a pretty-printed JSON array of provinces:
//! `[{"name": .., "web_url": .., "cities": [{"name": .., "web_url": ..}]}]`.

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::Path,
    time::{Duration, SystemTime},
};
use tracing::debug;

use crate::{
    error::{Result, WeatherError},
    model::Province,
};

/// Provinces in the order they appear on the root listing page.
///
/// Names are not unique; lookups always take the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index {
    provinces: Vec<Province>,
}

impl Index {
    pub fn new(provinces: Vec<Province>) -> Self {
        Self { provinces }
    }

    pub fn provinces(&self) -> &[Province] {
        &self.provinces
    }

    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty()
    }

    pub fn city_count(&self) -> usize {
        self.provinces.iter().map(|p| p.cities.len()).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the index, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| WeatherError::io(parent, e))?;
        }

        let json = self.to_json()?;
        fs::write(path, json).map_err(|e| WeatherError::io(path, e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| WeatherError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Like [`Index::load`], but a missing or unreadable file gives an empty index.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(index) => index,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "index unavailable, using empty index");
                Self::default()
            }
        }
    }
}

/// How long ago the index file was last written.
pub fn index_age(path: &Path) -> Result<Duration> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| WeatherError::io(path, e))?;

    Ok(SystemTime::now().duration_since(modified).unwrap_or_default())
}
