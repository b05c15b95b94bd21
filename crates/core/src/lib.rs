//! Core types and traits for playerstats
//!
//! This crate defines the foundational types used throughout the system:
//! - PlayerId, ShareCode: UUID-backed identifiers
//! - ReferenceDataset: immutable name → id snapshot
//! - ComputeRequest, Target, Requester: what a lookup asks for
//! - ComputeResult, StatValue, TopList: what a lookup produces
//! - Collaborator traits: ConfigProvider, PlayerDirectory, Calculator,
//!   OutputFormatter, NotificationSink
//! - Error: Error type hierarchy
//! - Limits: quotas, capacities and thresholds
//! - Clock: wall-clock abstraction

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod error;
pub mod limits;
pub mod request;
pub mod result;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use limits::Limits;
pub use request::{ComputeRequest, Requester, RequesterKind, SubStatistic, Target};
pub use result::{ComputeResult, FormattedOutput, StatValue, TopList};
pub use traits::{
    Calculator, ConfigProvider, Notice, NotificationSink, OutputFormatter, PlayerDirectory,
};
pub use types::{DebugLevel, KnownPlayer, PlayerId, ReferenceDataset, ShareCode};
