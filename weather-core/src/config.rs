use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_ORIGIN: &str = "https://weather.cma.cn";
pub const DEFAULT_ROOT_LISTING_PATH: &str = "/web/text/HB/ABJ.html";

/// The origin site serves a different page to non-browser agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

pub const DEFAULT_CRAWL_CONCURRENCY: usize = 3;
pub const DEFAULT_INDEX_MAX_AGE_DAYS: u64 = 30;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// origin = "https://weather.cma.cn"
/// crawl_concurrency = 3
/// index_path = "/tmp/index.json"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL prefixed onto every relative link found while crawling.
    pub origin: String,

    /// Path of the page listing every province.
    pub root_listing_path: String,

    pub user_agent: String,

    /// Upper bound on province listing fetches in flight during a rebuild.
    pub crawl_concurrency: usize,

    /// Where the province/city index lives. Defaults to the platform data dir.
    pub index_path: Option<PathBuf>,

    /// An index older than this is reported as stale.
    pub index_max_age_days: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            root_listing_path: DEFAULT_ROOT_LISTING_PATH.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            crawl_concurrency: DEFAULT_CRAWL_CONCURRENCY,
            index_path: None,
            index_max_age_days: DEFAULT_INDEX_MAX_AGE_DAYS,
        }
    }
}

impl Config {
    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "cnweather", "cnweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the persisted index, honouring `index_path` when set.
    pub fn index_file_path(&self) -> Result<PathBuf> {
        match &self.index_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("index.json")),
        }
    }

    /// URL of the page listing all provinces.
    pub fn root_listing_url(&self) -> String {
        format!("{}{}", self.origin, self.root_listing_path)
    }

    /// Never zero, so a crawl always makes progress.
    pub fn crawl_concurrency(&self) -> usize {
        self.crawl_concurrency.max(1)
    }

    pub fn index_max_age(&self) -> Duration {
        Duration::from_secs(self.index_max_age_days * 24 * 60 * 60)
    }
}
