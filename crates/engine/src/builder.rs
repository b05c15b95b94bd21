//! Engine builder
//!
//! Collects the collaborators an engine needs. Config, player directory,
//! calculator, formatter and notification sink are required; clock,
//! limits and log handle default to the system clock, production limits
//! and no log-level control.
//!
//! ```ignore
//! use playerstats_engine::{FileConfig, StatsEngine};
//!
//! let engine = StatsEngine::builder()
//!     .config(Arc::new(FileConfig::open_in(data_dir)?))
//!     .directory(directory)
//!     .calculator(calculator)
//!     .formatter(formatter)
//!     .sink(sink)
//!     .build()?;
//! engine.submit_reload(None)?; // startup
//! ```

use playerstats_core::{
    Calculator, Clock, ConfigProvider, Error, Limits, NotificationSink, OutputFormatter,
    PlayerDirectory, Result, SystemClock,
};
use std::sync::Arc;

use crate::engine::StatsEngine;
use crate::logging::LogHandle;

pub(crate) struct Collaborators {
    pub(crate) config: Arc<dyn ConfigProvider>,
    pub(crate) directory: Arc<dyn PlayerDirectory>,
    pub(crate) calculator: Arc<dyn Calculator>,
    pub(crate) formatter: Arc<dyn OutputFormatter>,
    pub(crate) sink: Arc<dyn NotificationSink>,
}

/// Builder for [`StatsEngine`]
#[derive(Default)]
pub struct EngineBuilder {
    config: Option<Arc<dyn ConfigProvider>>,
    directory: Option<Arc<dyn PlayerDirectory>>,
    calculator: Option<Arc<dyn Calculator>>,
    formatter: Option<Arc<dyn OutputFormatter>>,
    sink: Option<Arc<dyn NotificationSink>>,
    clock: Option<Arc<dyn Clock>>,
    limits: Limits,
    log: Option<LogHandle>,
}

impl EngineBuilder {
    /// Create a builder with nothing set
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings source (required)
    pub fn config(mut self, config: Arc<dyn ConfigProvider>) -> Self {
        self.config = Some(config);
        self
    }

    /// Player source (required)
    pub fn directory(mut self, directory: Arc<dyn PlayerDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Aggregation formulas (required)
    pub fn calculator(mut self, calculator: Arc<dyn Calculator>) -> Self {
        self.calculator = Some(calculator);
        self
    }

    /// Message rendering (required)
    pub fn formatter(mut self, formatter: Arc<dyn OutputFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Message delivery (required)
    pub fn sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Time source for cooldowns and recency limits
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Quotas, capacities and thresholds
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Let reloads apply the configured debug level
    pub fn log_handle(mut self, log: LogHandle) -> Self {
        self.log = Some(log);
        self
    }

    /// Build the engine
    ///
    /// The engine starts with an empty dataset; submit the startup reload
    /// to load players.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first missing collaborator.
    pub fn build(self) -> Result<StatsEngine> {
        let collaborators = Collaborators {
            config: self.config.ok_or_else(|| missing("config"))?,
            directory: self.directory.ok_or_else(|| missing("directory"))?,
            calculator: self.calculator.ok_or_else(|| missing("calculator"))?,
            formatter: self.formatter.ok_or_else(|| missing("formatter"))?,
            sink: self.sink.ok_or_else(|| missing("sink"))?,
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        Ok(StatsEngine::from_parts(collaborators, clock, self.limits, self.log))
    }
}

fn missing(what: &str) -> Error {
    Error::config(format!("engine builder: no {} was set", what))
}
