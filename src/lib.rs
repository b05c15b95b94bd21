//! PlayerStats - on-demand player statistics with result sharing
//!
//! PlayerStats computes expensive statistics over every known player of a
//! server, keeps reloads of the player set from interleaving with running
//! calculations, and lets players share a computed result with everyone
//! through a one-time share code.
//!
//! # Quick Start
//!
//! ```ignore
//! use playerstats::{ComputeRequest, FileConfig, Requester, StatsEngine};
//! use std::sync::Arc;
//!
//! let engine = StatsEngine::builder()
//!     .config(Arc::new(FileConfig::open_in(data_dir)?))
//!     .directory(directory)
//!     .calculator(calculator)
//!     .formatter(formatter)
//!     .sink(sink)
//!     .build()?;
//!
//! // Startup: load the player set
//! engine.submit_reload(None)?.join()?;
//!
//! // Look up a statistic on a job thread
//! let request = ComputeRequest::top(Requester::player("Alex"), "jump");
//! let result = engine.submit_compute(request)?.join()?;
//! ```
//!
//! # Architecture
//!
//! The embedding application implements the collaborator traits
//! ([`ConfigProvider`], [`PlayerDirectory`], [`Calculator`],
//! [`OutputFormatter`], [`NotificationSink`]); the [`StatsEngine`] does
//! the scheduling, loading and sharing.

pub use playerstats_concurrency::{CalcTimeTracker, Job, JobHandle, WaitEstimate};
pub use playerstats_core::*;
pub use playerstats_engine::{
    logging, CycleKind, EngineBuilder, FileConfig, FilterPolicy, LogHandle, MemoryConfig,
    PlayerSetLoader, ShareOutcome, Settings, SourceSelection, StatsConfig, StatsEngine,
    CONFIG_FILE_NAME,
};
pub use playerstats_share::{Redemption, RedeemedLedger, ShareCache, SharedResultEntry};
