//! Parallel player-set loader
//!
//! Builds a [`ReferenceDataset`] from the player directory's candidates:
//!
//! 1. The candidate slice is split in halves recursively with
//!    `rayon::join` until a part is no larger than the split threshold.
//! 2. Each part is scanned sequentially; candidates that pass the filter
//!    policy and the recency limit go into one shared `DashMap`.
//! 3. Once every part is done the map is frozen into the dataset.
//!
//! `load` returns only after all parts completed, so no partial dataset
//! ever escapes. The result does not depend on the split threshold.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use playerstats_core::limits::LOADER_SPLIT_THRESHOLD;
use playerstats_core::{
    Clock, KnownPlayer, PlayerDirectory, PlayerId, ReferenceDataset, Result, SystemClock,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Which players a reload loads, as chosen by the settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceSelection {
    /// Everybody the directory knows
    #[default]
    All,
    /// Only whitelisted players
    Whitelisted,
    /// Everybody except banned players
    ExcludeBanned,
}

impl SourceSelection {
    /// Whitelist-only takes precedence over excluding banned players
    pub fn from_flags(whitelist_only: bool, exclude_banned: bool) -> Self {
        if whitelist_only {
            SourceSelection::Whitelisted
        } else if exclude_banned {
            SourceSelection::ExcludeBanned
        } else {
            SourceSelection::All
        }
    }
}

/// Membership filter applied to every candidate
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterPolicy {
    /// Keep every candidate
    #[default]
    None,
    /// Keep only these ids
    AllowList(HashSet<PlayerId>),
    /// Drop these ids
    DenyBanned(HashSet<PlayerId>),
}

impl FilterPolicy {
    /// Fetch the id set a selection needs from the directory
    ///
    /// # Errors
    ///
    /// Propagates directory failures unchanged.
    pub fn resolve(selection: SourceSelection, directory: &dyn PlayerDirectory) -> Result<Self> {
        Ok(match selection {
            SourceSelection::All => FilterPolicy::None,
            SourceSelection::Whitelisted => FilterPolicy::AllowList(
                directory
                    .whitelisted()?
                    .into_iter()
                    .map(|player| player.id)
                    .collect(),
            ),
            SourceSelection::ExcludeBanned => FilterPolicy::DenyBanned(directory.banned()?),
        })
    }

    fn admits(&self, id: &PlayerId) -> bool {
        match self {
            FilterPolicy::None => true,
            FilterPolicy::AllowList(allowed) => allowed.contains(id),
            FilterPolicy::DenyBanned(banned) => !banned.contains(id),
        }
    }
}

struct Admission<'a> {
    policy: &'a FilterPolicy,
    cutoff: Option<DateTime<Utc>>,
}

impl Admission<'_> {
    fn admits(&self, player: &KnownPlayer) -> bool {
        if !self.policy.admits(&player.id) {
            return false;
        }
        // No timestamp counts as infinitely recent
        match (self.cutoff, player.last_played) {
            (Some(cutoff), Some(last_played)) => last_played >= cutoff,
            _ => true,
        }
    }
}

/// Builds reference datasets in parallel
pub struct PlayerSetLoader {
    split_threshold: usize,
    clock: Arc<dyn Clock>,
}

impl Default for PlayerSetLoader {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl PlayerSetLoader {
    /// Loader with the default split threshold
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        PlayerSetLoader {
            split_threshold: LOADER_SPLIT_THRESHOLD,
            clock,
        }
    }

    /// Scan parts of at most `threshold` candidates sequentially (at least 1)
    pub fn with_split_threshold(mut self, threshold: usize) -> Self {
        self.split_threshold = threshold.max(1);
        self
    }

    /// Current split threshold
    pub fn split_threshold(&self) -> usize {
        self.split_threshold
    }

    /// Build a dataset from `source`
    ///
    /// Candidates without a name are skipped. When two candidates share a
    /// name, one of them wins.
    pub fn load(
        &self,
        source: &[KnownPlayer],
        policy: &FilterPolicy,
        recency_limit: Duration,
    ) -> ReferenceDataset {
        let started = Instant::now();
        let admission = Admission {
            policy,
            cutoff: self.cutoff(recency_limit),
        };

        let target = DashMap::with_capacity(source.len());
        scan(source, &admission, &target, self.split_threshold);
        let entries: HashMap<String, PlayerId> = target.into_iter().collect();

        debug!(
            target: "playerstats::loader",
            candidates = source.len(),
            loaded = entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded player set"
        );
        ReferenceDataset::new(entries)
    }

    fn cutoff(&self, recency_limit: Duration) -> Option<DateTime<Utc>> {
        if recency_limit.is_zero() {
            return None;
        }
        let limit = chrono::Duration::from_std(recency_limit).ok()?;
        self.clock.now().checked_sub_signed(limit)
    }
}

fn scan(
    part: &[KnownPlayer],
    admission: &Admission<'_>,
    target: &DashMap<String, PlayerId>,
    threshold: usize,
) {
    if part.len() > threshold {
        let (left, right) = part.split_at(part.len() / 2);
        rayon::join(
            || scan(left, admission, target, threshold),
            || scan(right, admission, target, threshold),
        );
        return;
    }

    for player in part {
        let Some(name) = player.name.as_deref() else {
            continue;
        };
        if admission.admits(player) {
            target.insert(name.to_string(), player.id);
        }
    }
}
