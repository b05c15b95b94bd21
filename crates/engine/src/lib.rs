//! Stats engine for playerstats
//!
//! This crate ties the lower layers together:
//! - StatsEngine: the context object; submits reloads and stat jobs, shares results
//! - ReloadCoordinator: one reload cycle (settings + dataset rebuild)
//! - StatExecutor: one stat request
//! - PlayerSetLoader: parallel dataset build with filtering
//! - Configuration (`playerstats.toml`) and logging setup
//!
//! The engine is the only component that knows about:
//! - Which jobs must wait for which
//! - When settings and datasets are published
//! - How results reach the share cache

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod engine;
pub mod executor;
pub mod loader;
pub mod logging;
pub mod reload;
pub mod settings;
pub mod snapshot;

pub use builder::EngineBuilder;
pub use config::{FileConfig, MemoryConfig, StatsConfig, CONFIG_FILE_NAME};
pub use engine::{ShareOutcome, StatsEngine};
pub use executor::StatExecutor;
pub use loader::{FilterPolicy, PlayerSetLoader, SourceSelection};
pub use logging::LogHandle;
pub use reload::{CycleKind, ReloadCoordinator};
pub use settings::Settings;
pub use snapshot::SnapshotCell;
