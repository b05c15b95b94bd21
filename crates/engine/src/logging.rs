//! Logging setup
//!
//! Installs a global `tracing` subscriber whose level follows the
//! configured [`DebugLevel`]. The level sits behind a reload layer, so a
//! reload cycle can change verbosity without reinstalling the subscriber.
//!
//! | DebugLevel | max level |
//! |------------|-----------|
//! | low        | INFO      |
//! | medium     | DEBUG     |
//! | high       | TRACE     |

use playerstats_core::{DebugLevel, Error, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, Registry};

/// Maximum level emitted for a debug level
pub fn level_filter(level: DebugLevel) -> LevelFilter {
    match level {
        DebugLevel::Low => LevelFilter::INFO,
        DebugLevel::Medium => LevelFilter::DEBUG,
        DebugLevel::High => LevelFilter::TRACE,
    }
}

/// Handle for changing the level of the installed subscriber
#[derive(Clone)]
pub struct LogHandle {
    inner: reload::Handle<LevelFilter, Registry>,
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("level", &self.current())
            .finish()
    }
}

impl LogHandle {
    /// Switch the subscriber to `level`
    ///
    /// # Errors
    ///
    /// Returns `Error::Internal` if the subscriber is gone.
    pub fn set_level(&self, level: DebugLevel) -> Result<()> {
        let filter = level_filter(level);
        self.inner
            .modify(|current| *current = filter)
            .map_err(|e| Error::internal(format!("failed to change log level: {}", e)))
    }

    /// Level currently in effect
    pub fn current(&self) -> Option<LevelFilter> {
        self.inner.clone_current()
    }
}

/// Install the global subscriber at `level`
///
/// # Errors
///
/// Returns `Error::Internal` if a global subscriber is already installed.
pub fn init(level: DebugLevel) -> Result<LogHandle> {
    let (filter, handle) = reload::Layer::new(level_filter(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| Error::internal(format!("failed to install logger: {}", e)))?;
    Ok(LogHandle { inner: handle })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_filters() {
        assert_eq!(level_filter(DebugLevel::Low), LevelFilter::INFO);
        assert_eq!(level_filter(DebugLevel::Medium), LevelFilter::DEBUG);
        assert_eq!(level_filter(DebugLevel::High), LevelFilter::TRACE);
    }

    #[test]
    fn init_once_then_adjust() {
        let handle = init(DebugLevel::Low).unwrap();
        assert_eq!(handle.current(), Some(LevelFilter::INFO));

        handle.set_level(DebugLevel::High).unwrap();
        assert_eq!(handle.current(), Some(LevelFilter::TRACE));

        assert!(matches!(init(DebugLevel::Low), Err(Error::Internal(_))));
    }
}
