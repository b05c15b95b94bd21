//! Capacity limits and timing thresholds
//!
//! This module defines the bounds enforced by the share cache, the loader
//! and the stat executor. Exceeding a capacity is never an error: the owning
//! component evicts or compacts deterministically instead.

use std::time::Duration;

/// Live shared results kept per owner
pub const SHARE_QUOTA_PER_OWNER: usize = 25;

/// Redeemed codes remembered by the ledger
pub const REDEEMED_LEDGER_CAPACITY: usize = 500;

/// Redeemed codes kept when a full ledger is compacted (10% of capacity)
pub const REDEEMED_LEDGER_RETAINED: usize = REDEEMED_LEDGER_CAPACITY / 10;

/// Candidates a loader partition scans sequentially before splitting
pub const LOADER_SPLIT_THRESHOLD: usize = 1000;

/// Calculation durations averaged to predict the next one
pub const CALC_TIME_WINDOW: usize = 10;

/// Capacity limits and thresholds
///
/// The defaults are the production values; tests shrink them with
/// [`Limits::with_small_limits`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Live shared results kept per owner (default: 25)
    pub share_quota_per_owner: usize,

    /// Redeemed codes remembered (default: 500)
    pub ledger_capacity: usize,

    /// Redeemed codes kept on compaction (default: 50)
    pub ledger_retained: usize,

    /// Loader partition size before splitting (default: 1000)
    pub loader_split_threshold: usize,

    /// Calculation durations averaged (default: 10)
    pub calc_time_window: usize,

    /// Average above which requesters are told to wait (default: 2s)
    pub wait_notice_after: Duration,

    /// Average above which the wait notice says "long" (default: 20s)
    pub long_wait_notice_after: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            share_quota_per_owner: SHARE_QUOTA_PER_OWNER,
            ledger_capacity: REDEEMED_LEDGER_CAPACITY,
            ledger_retained: REDEEMED_LEDGER_RETAINED,
            loader_split_threshold: LOADER_SPLIT_THRESHOLD,
            calc_time_window: CALC_TIME_WINDOW,
            wait_notice_after: Duration::from_secs(2),
            long_wait_notice_after: Duration::from_secs(20),
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    ///
    /// Keeps the quota at its production value (it is part of the observable
    /// contract) but shrinks the ledger and the loader threshold so that
    /// compaction and recursive splitting happen with little data.
    pub fn with_small_limits() -> Self {
        Limits {
            ledger_capacity: 10,
            ledger_retained: 1,
            loader_split_threshold: 4,
            calc_time_window: 3,
            wait_notice_after: Duration::from_millis(20),
            long_wait_notice_after: Duration::from_millis(200),
            ..Limits::default()
        }
    }
}
