//! Settings resolved by a reload cycle

use playerstats_core::{ConfigProvider, DebugLevel};
use std::time::Duration;

use crate::loader::SourceSelection;

/// Settings in effect between two reloads
///
/// Resolved from the [`ConfigProvider`] once per reload cycle and
/// published next to the dataset, so a stat job never sees the provider
/// half-updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Logging verbosity
    pub debug_level: DebugLevel,
    /// Which players are loaded
    pub selection: SourceSelection,
    /// Recency limit (`Duration::ZERO` = none)
    pub last_activity_limit: Duration,
    /// Whether results may be shared
    pub sharing_enabled: bool,
    /// Minutes between two shares by the same player
    pub share_cooldown_minutes: u32,
    /// Maximum length of a top list
    pub top_list_size: usize,
}

impl Settings {
    /// Read every setting from `config`
    pub fn resolve(config: &dyn ConfigProvider) -> Self {
        Settings {
            debug_level: config.debug_level(),
            selection: SourceSelection::from_flags(config.whitelist_only(), config.exclude_banned()),
            last_activity_limit: config.last_activity_limit(),
            sharing_enabled: config.sharing_enabled(),
            share_cooldown_minutes: config.share_cooldown_minutes(),
            top_list_size: config.top_list_size().max(1),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            debug_level: DebugLevel::default(),
            selection: SourceSelection::All,
            last_activity_limit: Duration::ZERO,
            sharing_enabled: false,
            share_cooldown_minutes: 0,
            top_list_size: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemoryConfig, StatsConfig};

    #[test]
    fn whitelist_wins_over_banned() {
        let config = MemoryConfig::new(StatsConfig {
            whitelist_only: true,
            exclude_banned: true,
            ..StatsConfig::default()
        });
        assert_eq!(Settings::resolve(&config).selection, SourceSelection::Whitelisted);
    }

    #[test]
    fn resolve_copies_values() {
        let config = MemoryConfig::new(StatsConfig {
            exclude_banned: true,
            share_waiting_time_minutes: 3,
            top_list_size: 5,
            ..StatsConfig::default()
        });
        let settings = Settings::resolve(&config);
        assert_eq!(settings.selection, SourceSelection::ExcludeBanned);
        assert_eq!(settings.share_cooldown_minutes, 3);
        assert_eq!(settings.top_list_size, 5);
        assert!(settings.sharing_enabled);
    }
}
