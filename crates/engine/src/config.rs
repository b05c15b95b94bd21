//! Engine configuration via `playerstats.toml`
//!
//! On first open a commented default `playerstats.toml` is written. To
//! change settings, edit the file and trigger a reload; every reload cycle
//! after startup re-reads it.

use parking_lot::RwLock;
use playerstats_core::{ConfigProvider, DebugLevel, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "playerstats.toml";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Settings loaded from `playerstats.toml`
///
/// # Example
///
/// ```toml
/// debug_level = "low"
/// whitelist_only = false
/// exclude_banned = true
/// last_played_limit_days = 30
/// enable_stat_sharing = true
/// share_waiting_time_minutes = 5
/// top_list_size = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Logging verbosity: `"low"`, `"medium"` or `"high"`.
    #[serde(default)]
    pub debug_level: DebugLevel,
    /// Only load whitelisted players.
    #[serde(default)]
    pub whitelist_only: bool,
    /// Leave banned players out of the dataset.
    #[serde(default)]
    pub exclude_banned: bool,
    /// Skip players not seen for this many days (0 = no limit).
    #[serde(default)]
    pub last_played_limit_days: u32,
    /// Allow players to share their results.
    #[serde(default = "default_true")]
    pub enable_stat_sharing: bool,
    /// Minutes between two shares by the same player (0 = no cooldown).
    #[serde(default)]
    pub share_waiting_time_minutes: u32,
    /// Number of entries in a top list.
    #[serde(default = "default_top_list_size")]
    pub top_list_size: usize,
}

fn default_true() -> bool {
    true
}

fn default_top_list_size() -> usize {
    10
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            debug_level: DebugLevel::default(),
            whitelist_only: false,
            exclude_banned: false,
            last_played_limit_days: 0,
            enable_stat_sharing: true,
            share_waiting_time_minutes: 0,
            top_list_size: default_top_list_size(),
        }
    }
}

impl StatsConfig {
    /// Check values serde cannot check
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `top_list_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.top_list_size == 0 {
            return Err(Error::config(
                "top_list_size in playerstats.toml must be at least 1",
            ));
        }
        Ok(())
    }

    /// The recency limit as a duration (`Duration::ZERO` = no limit)
    pub fn last_activity_limit(&self) -> Duration {
        Duration::from_secs(u64::from(self.last_played_limit_days) * SECONDS_PER_DAY)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# PlayerStats configuration
#
# Logging verbosity: "low" (default), "medium" or "high"
#   "low"    = startup, reloads and errors
#   "medium" = plus timings of each reload phase
#   "high"   = plus per-request tracing
debug_level = "low"

# Only load whitelisted players (default: false)
whitelist_only = false

# Leave banned players out of stat results (default: false)
exclude_banned = false

# Skip players who have not played for this many days (0 = no limit)
last_played_limit_days = 0

# Allow players to share their results with the whole server (default: true)
enable_stat_sharing = true

# Minutes a player has to wait between two shares (0 = no waiting time)
share_waiting_time_minutes = 0

# Number of players in a top list (default: 10)
top_list_size = 10
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: StatsConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// Settings backed by a `playerstats.toml` file
#[derive(Debug)]
pub struct FileConfig {
    path: PathBuf,
    current: RwLock<StatsConfig>,
}

impl FileConfig {
    /// Open `path`, writing the default file first if it is missing
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written, read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        StatsConfig::write_default_if_missing(&path)?;
        let config = StatsConfig::from_file(&path)?;
        info!(target: "playerstats::config", path = %path.display(), "loaded config");
        Ok(FileConfig {
            path,
            current: RwLock::new(config),
        })
    }

    /// Open `playerstats.toml` inside `dir`
    pub fn open_in(dir: &Path) -> Result<Self> {
        Self::open(dir.join(CONFIG_FILE_NAME))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the settings as last read
    pub fn snapshot(&self) -> StatsConfig {
        self.current.read().clone()
    }
}

impl ConfigProvider for FileConfig {
    fn reload_config(&self) -> Result<bool> {
        if !self.path.exists() {
            info!(
                target: "playerstats::config",
                path = %self.path.display(),
                "config file is gone, keeping current settings"
            );
            return Ok(false);
        }
        let config = StatsConfig::from_file(&self.path)?;
        *self.current.write() = config;
        Ok(true)
    }

    fn whitelist_only(&self) -> bool {
        self.current.read().whitelist_only
    }

    fn exclude_banned(&self) -> bool {
        self.current.read().exclude_banned
    }

    fn last_activity_limit(&self) -> Duration {
        self.current.read().last_activity_limit()
    }

    fn sharing_enabled(&self) -> bool {
        self.current.read().enable_stat_sharing
    }

    fn share_cooldown_minutes(&self) -> u32 {
        self.current.read().share_waiting_time_minutes
    }

    fn debug_level(&self) -> DebugLevel {
        self.current.read().debug_level
    }

    fn top_list_size(&self) -> usize {
        self.current.read().top_list_size
    }
}

/// In-process settings, for embedding without a file and for tests
#[derive(Debug, Default)]
pub struct MemoryConfig {
    current: RwLock<StatsConfig>,
    reloads: AtomicU64,
}

impl MemoryConfig {
    /// Wrap a config
    pub fn new(config: StatsConfig) -> Self {
        MemoryConfig {
            current: RwLock::new(config),
            reloads: AtomicU64::new(0),
        }
    }

    /// Change settings in place; they apply from the next reload
    pub fn update(&self, change: impl FnOnce(&mut StatsConfig)) {
        change(&mut self.current.write());
    }

    /// Number of `reload_config` calls so far
    pub fn reload_count(&self) -> u64 {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl ConfigProvider for MemoryConfig {
    fn reload_config(&self) -> Result<bool> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        self.current.read().validate()?;
        Ok(true)
    }

    fn whitelist_only(&self) -> bool {
        self.current.read().whitelist_only
    }

    fn exclude_banned(&self) -> bool {
        self.current.read().exclude_banned
    }

    fn last_activity_limit(&self) -> Duration {
        self.current.read().last_activity_limit()
    }

    fn sharing_enabled(&self) -> bool {
        self.current.read().enable_stat_sharing
    }

    fn share_cooldown_minutes(&self) -> u32 {
        self.current.read().share_waiting_time_minutes
    }

    fn debug_level(&self) -> DebugLevel {
        self.current.read().debug_level
    }

    fn top_list_size(&self) -> usize {
        self.current.read().top_list_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_toml_parses_to_default() {
        let config: StatsConfig = toml::from_str(StatsConfig::default_toml()).unwrap();
        assert_eq!(config, StatsConfig::default());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: StatsConfig = toml::from_str("exclude_banned = true").unwrap();
        assert!(config.exclude_banned);
        assert!(config.enable_stat_sharing);
        assert_eq!(config.top_list_size, 10);
        assert_eq!(config.debug_level, DebugLevel::Low);
    }

    #[test]
    fn parse_debug_level() {
        let config: StatsConfig = toml::from_str("debug_level = \"high\"").unwrap();
        assert_eq!(config.debug_level, DebugLevel::High);
        assert!(toml::from_str::<StatsConfig>("debug_level = \"loud\"").is_err());
    }

    #[test]
    fn zero_top_list_size_is_rejected() {
        let config: StatsConfig = toml::from_str("top_list_size = 0").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn last_activity_limit_in_days() {
        let config = StatsConfig {
            last_played_limit_days: 2,
            ..StatsConfig::default()
        };
        assert_eq!(config.last_activity_limit(), Duration::from_secs(2 * 86_400));
        assert_eq!(StatsConfig::default().last_activity_limit(), Duration::ZERO);
    }

    #[test]
    fn open_writes_default_file() {
        let dir = TempDir::new().unwrap();
        let config = FileConfig::open_in(dir.path()).unwrap();
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
        assert_eq!(config.snapshot(), StatsConfig::default());
    }

    #[test]
    fn open_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "top_list_size = 3\n").unwrap();

        let config = FileConfig::open(&path).unwrap();
        assert_eq!(config.top_list_size(), 3);
    }

    #[test]
    fn reload_picks_up_edits() {
        let dir = TempDir::new().unwrap();
        let config = FileConfig::open_in(dir.path()).unwrap();
        assert!(config.sharing_enabled());

        std::fs::write(
            config.path(),
            "enable_stat_sharing = false\nshare_waiting_time_minutes = 5\n",
        )
        .unwrap();
        assert!(config.reload_config().unwrap());
        assert!(!config.sharing_enabled());
        assert_eq!(config.share_cooldown_minutes(), 5);
    }

    #[test]
    fn reload_without_file_keeps_settings() {
        let dir = TempDir::new().unwrap();
        let config = FileConfig::open_in(dir.path()).unwrap();
        std::fs::remove_file(config.path()).unwrap();

        assert!(!config.reload_config().unwrap());
        assert_eq!(config.top_list_size(), 10);
    }

    #[test]
    fn reload_with_broken_file_errors_and_keeps_settings() {
        let dir = TempDir::new().unwrap();
        let config = FileConfig::open_in(dir.path()).unwrap();
        std::fs::write(config.path(), "top_list_size = \"many\"").unwrap();

        assert!(matches!(config.reload_config(), Err(Error::Config(_))));
        assert_eq!(config.top_list_size(), 10);
    }

    #[test]
    fn write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = StatsConfig {
            debug_level: DebugLevel::Medium,
            whitelist_only: true,
            share_waiting_time_minutes: 7,
            ..StatsConfig::default()
        };

        config.write_to_file(&path).unwrap();
        assert_eq!(StatsConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn memory_config_counts_reloads() {
        let config = MemoryConfig::new(StatsConfig::default());
        config.update(|c| c.exclude_banned = true);
        assert!(config.exclude_banned());
        assert!(config.reload_config().unwrap());
        assert_eq!(config.reload_count(), 1);
    }
}
