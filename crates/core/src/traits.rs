//! Collaborator traits
//!
//! The engine computes nothing itself and renders nothing itself. It calls
//! into these traits, which the embedding application implements:
//!
//! - [`ConfigProvider`]: settings re-resolved on each reload
//! - [`PlayerDirectory`]: the source collection scanned on reload
//! - [`Calculator`]: the aggregation formulas
//! - [`OutputFormatter`]: numbers → formatted messages
//! - [`NotificationSink`]: message delivery
//!
//! Thread safety: all traits are `Send + Sync`; the engine calls them from
//! job threads concurrently.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::Result;
use crate::request::{ComputeRequest, Requester};
use crate::result::{FormattedOutput, StatValue, TopList};
use crate::types::{DebugLevel, KnownPlayer, PlayerId, ReferenceDataset, ShareCode};

/// Source of settings
pub trait ConfigProvider: Send + Sync {
    /// Re-read the underlying configuration
    ///
    /// Returns `Ok(true)` if the configuration was actually re-read, which
    /// makes the calling cycle a full reload.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration exists but cannot be parsed.
    fn reload_config(&self) -> Result<bool>;

    /// Only load whitelisted players
    fn whitelist_only(&self) -> bool;

    /// Leave banned players out of the dataset
    fn exclude_banned(&self) -> bool;

    /// Exclude players whose last activity is older than this
    /// (`Duration::ZERO` disables the filter)
    fn last_activity_limit(&self) -> Duration;

    /// Whether results may be shared
    fn sharing_enabled(&self) -> bool;

    /// Minutes a player waits between two shares (0 disables the cooldown)
    fn share_cooldown_minutes(&self) -> u32;

    /// Logging verbosity
    fn debug_level(&self) -> DebugLevel;

    /// Maximum number of entries in a top list
    fn top_list_size(&self) -> usize;
}

/// Source collection of known players
pub trait PlayerDirectory: Send + Sync {
    /// Every player the server has seen
    fn all_known(&self) -> Result<Vec<KnownPlayer>>;

    /// Players on the whitelist
    fn whitelisted(&self) -> Result<Vec<KnownPlayer>>;

    /// Ids of banned players
    fn banned(&self) -> Result<HashSet<PlayerId>>;
}

/// The aggregation formulas
///
/// Each call is synchronous and may take a long time for server and top
/// lookups. Implementations may return `Error::ConcurrentModification` if
/// the data they iterate over changed underneath them.
pub trait Calculator: Send + Sync {
    /// Value for the player named in the request's target
    fn compute_player(&self, request: &ComputeRequest, dataset: &ReferenceDataset) -> Result<i32>;

    /// Total over every player in the dataset
    fn compute_server(&self, request: &ComputeRequest, dataset: &ReferenceDataset) -> Result<i64>;

    /// Ranked top list, best first
    fn compute_top(&self, request: &ComputeRequest, dataset: &ReferenceDataset)
        -> Result<TopList>;
}

/// Turns a raw value into a message
///
/// A pure function of the value and the requester: the requester only
/// decides console-vs-interactive styling. When `share_code` is present the
/// message offers the requester a way to share it.
pub trait OutputFormatter: Send + Sync {
    /// Render a value for a requester
    fn render(
        &self,
        request: &ComputeRequest,
        value: &StatValue,
        share_code: Option<ShareCode>,
    ) -> FormattedOutput;
}

/// Advisory and feedback messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    /// A reload finished
    Reloaded,
    /// A request waits for a running reload
    StillReloading,
    /// Calculations have been slow lately; `long` for very slow
    WaitAMoment {
        /// Chosen by the higher threshold
        long: bool,
    },
    /// A calculation failed for an unexpected reason
    UnknownError,
    /// The share code was redeemed before
    ResultsAlreadyShared,
    /// The requester shared too recently
    StillOnShareCooldown,
    /// The share code is unknown or was evicted
    StatResultsTooOld,
    /// Sharing is turned off
    SharingDisabled,
}

/// Message delivery
///
/// Fire-and-forget from the engine's point of view: a failed delivery is
/// logged and dropped, never retried.
pub trait NotificationSink: Send + Sync {
    /// Send an advisory notice
    fn notify(&self, requester: &Requester, notice: Notice) -> Result<()>;

    /// Send a finished result to its requester
    fn deliver(&self, requester: &Requester, output: &FormattedOutput) -> Result<()>;

    /// Send a shared result to everyone
    fn broadcast(&self, from: &Requester, output: &FormattedOutput) -> Result<()>;
}
