//! Share cache
//!
//! Stores formatted results under freshly minted share codes so that
//! another player can broadcast them later, exactly once.
//!
//! ## Structure
//!
//! - live store: code → entry, plus an owner → (sequence → code) index used
//!   for quota eviction. Present only while sharing is enabled.
//! - cooldown marks: owner → last redemption time. Survive disabling.
//! - redeemed ledger: bounded ring of redeemed codes. Survives disabling.
//!
//! The three parts are not transactionally linked; a redeem updates them
//! one after another.
//!
//! ## Locking
//!
//! Quota eviction holds the owner's index entry while it evicts and
//! inserts, so two deposits by the same owner cannot both see room for one
//! more entry. Every path that touches both maps locks the owner index
//! before the entry map.
//!
//! Owner names are compared case-insensitively.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use playerstats_core::{Clock, Error, FormattedOutput, Limits, Result, ShareCode, SystemClock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::ledger::RedeemedLedger;

/// One stored result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedResultEntry {
    /// Code that redeems this entry
    pub code: ShareCode,
    /// Player who produced the result
    pub owner: String,
    /// Global deposit order, strictly increasing
    pub sequence: u64,
    /// The formatted result as it will be broadcast
    pub payload: FormattedOutput,
    /// When the result was deposited
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct LiveStore {
    entries: DashMap<ShareCode, SharedResultEntry>,
    by_owner: DashMap<String, BTreeMap<u64, ShareCode>>,
}

/// Outcome of [`ShareCache::redeem_if_allowed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// The result was taken; the redeemer's cooldown started
    Redeemed(FormattedOutput),
    /// The redeemer shared too recently; nothing was taken
    CoolingDown(Duration),
    /// The code is unknown, already taken, or sharing is disabled
    Missing,
}

fn owner_key(owner: &str) -> String {
    owner.to_lowercase()
}

/// Capacity- and time-bounded store of shareable results
pub struct ShareCache {
    quota: usize,
    clock: Arc<dyn Clock>,
    cooldown_minutes: AtomicU32,
    live: RwLock<Option<LiveStore>>,
    cooldowns: DashMap<String, DateTime<Utc>>,
    ledger: RedeemedLedger,
    sequence: AtomicU64,
}

impl ShareCache {
    /// Create a cache with production limits and the system clock
    pub fn new(enabled: bool, cooldown_minutes: u32) -> Self {
        Self::with_limits(
            enabled,
            cooldown_minutes,
            &Limits::default(),
            Arc::new(SystemClock),
        )
    }

    /// Create a cache with explicit limits and clock
    pub fn with_limits(
        enabled: bool,
        cooldown_minutes: u32,
        limits: &Limits,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ShareCache {
            quota: limits.share_quota_per_owner.max(1),
            clock,
            cooldown_minutes: AtomicU32::new(cooldown_minutes),
            live: RwLock::new(enabled.then(LiveStore::default)),
            cooldowns: DashMap::new(),
            ledger: RedeemedLedger::new(limits.ledger_capacity, limits.ledger_retained),
            sequence: AtomicU64::new(0),
        }
    }

    /// Store a result for `owner` and return the code that redeems it
    ///
    /// If `owner` already holds the quota of live entries, the entries with
    /// the smallest sequence numbers are evicted first.
    ///
    /// # Errors
    ///
    /// Returns `Error::SharingDisabled` while sharing is turned off.
    pub fn deposit(&self, owner: &str, payload: FormattedOutput) -> Result<ShareCode> {
        let live = self.live.read();
        let store = live.as_ref().ok_or(Error::SharingDisabled)?;

        let mut owned = store.by_owner.entry(owner_key(owner)).or_default();
        while owned.len() >= self.quota {
            let Some((sequence, evicted)) = owned.pop_first() else {
                break;
            };
            store.entries.remove(&evicted);
            debug!(
                target: "playerstats::share",
                owner,
                sequence,
                "evicted oldest shared result"
            );
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let code = ShareCode::new();
        store.entries.insert(
            code,
            SharedResultEntry {
                code,
                owner: owner.to_string(),
                sequence,
                payload,
                created_at: self.clock.now(),
            },
        );
        owned.insert(sequence, code);

        debug!(target: "playerstats::share", owner, sequence, "saved shared result");
        Ok(code)
    }

    /// Take the result stored under `code`
    ///
    /// Exactly once: a second call with the same code returns `None`. On
    /// success `redeemer`'s cooldown starts and the code is recorded in the
    /// redeemed ledger. Returns `None` for unknown codes and while sharing
    /// is disabled.
    pub fn redeem(&self, redeemer: &str, code: &ShareCode) -> Option<FormattedOutput> {
        let removed = self.take_live(code)?;
        self.cooldowns.insert(owner_key(redeemer), self.clock.now());
        Some(self.finish_redeem(redeemer, code, removed))
    }

    /// Take the result stored under `code` unless `redeemer` is cooling down
    ///
    /// The cooldown check and the start of the new cooldown happen under the
    /// redeemer's mark, so concurrent calls by one redeemer cannot both
    /// pass. If the code turns out not to be live, the mark is put back.
    pub fn redeem_if_allowed(&self, redeemer: &str, code: &ShareCode) -> Redemption {
        let key = owner_key(redeemer);
        let total = i64::from(self.cooldown_minutes()) * 60;
        let now = self.clock.now();

        let previous = match self.cooldowns.entry(key.clone()) {
            Entry::Occupied(mut mark) => {
                let elapsed = (now - *mark.get()).num_seconds().max(0);
                if elapsed < total {
                    return Redemption::CoolingDown(Duration::from_secs((total - elapsed) as u64));
                }
                Some(mark.insert(now))
            }
            Entry::Vacant(mark) => {
                mark.insert(now);
                None
            }
        };

        match self.take_live(code) {
            Some(removed) => Redemption::Redeemed(self.finish_redeem(redeemer, code, removed)),
            None => {
                if let Entry::Occupied(mut mark) = self.cooldowns.entry(key) {
                    if *mark.get() == now {
                        match previous {
                            Some(previous) => {
                                mark.insert(previous);
                            }
                            None => {
                                mark.remove();
                            }
                        }
                    }
                }
                Redemption::Missing
            }
        }
    }

    fn take_live(&self, code: &ShareCode) -> Option<SharedResultEntry> {
        let live = self.live.read();
        let store = live.as_ref()?;

        let key = owner_key(&store.entries.get(code)?.owner);
        let removed = {
            let mut owned = store.by_owner.get_mut(&key);
            let (_, removed) = store.entries.remove(code)?;
            if let Some(owned) = owned.as_mut() {
                owned.remove(&removed.sequence);
            }
            removed
        };
        store.by_owner.remove_if(&key, |_, owned| owned.is_empty());
        Some(removed)
    }

    fn finish_redeem(
        &self,
        redeemer: &str,
        code: &ShareCode,
        removed: SharedResultEntry,
    ) -> FormattedOutput {
        self.ledger.record(*code);
        debug!(
            target: "playerstats::share",
            redeemer,
            owner = %removed.owner,
            sequence = removed.sequence,
            "redeemed shared result"
        );
        removed.payload
    }

    /// Cooldown check
    ///
    /// True when the cooldown is configured as zero, when `owner` has never
    /// redeemed, or when fewer than `minutes * 60` whole seconds passed
    /// since `owner`'s last redemption. A `true` only means "not yet
    /// allowed" when the configured cooldown is above zero; the share flow
    /// uses [`ShareCache::cooldown_remaining`] instead.
    pub fn is_on_cooldown(&self, owner: &str) -> bool {
        let minutes = self.cooldown_minutes();
        if minutes == 0 {
            return true;
        }
        match self.cooldowns.get(&owner_key(owner)) {
            None => true,
            Some(last) => self.elapsed_secs(*last) < i64::from(minutes) * 60,
        }
    }

    /// Time `owner` still has to wait before sharing again
    ///
    /// `None` when sharing is allowed now: no cooldown configured, no
    /// previous redemption, or the cooldown has passed.
    pub fn cooldown_remaining(&self, owner: &str) -> Option<Duration> {
        let total = i64::from(self.cooldown_minutes()) * 60;
        if total == 0 {
            return None;
        }
        let last = *self.cooldowns.get(&owner_key(owner))?;
        let elapsed = self.elapsed_secs(last);
        (elapsed < total).then(|| Duration::from_secs((total - elapsed) as u64))
    }

    fn elapsed_secs(&self, since: DateTime<Utc>) -> i64 {
        (self.clock.now() - since).num_seconds().max(0)
    }

    /// True if `code` was redeemed recently (ledger lookup only)
    pub fn already_redeemed(&self, code: &ShareCode) -> bool {
        self.ledger.contains(code)
    }

    /// Apply new sharing settings
    ///
    /// Turning sharing off purges every live entry; cooldown marks and the
    /// redeemed ledger are kept. Turning it on starts from an empty store.
    /// Staying on keeps the live entries.
    pub fn update_settings(&self, enabled: bool, cooldown_minutes: u32) {
        self.cooldown_minutes
            .store(cooldown_minutes, Ordering::SeqCst);

        let mut live = self.live.write();
        match (enabled, live.is_some()) {
            (true, false) => {
                *live = Some(LiveStore::default());
                info!(target: "playerstats::share", cooldown_minutes, "stat sharing enabled");
            }
            (false, true) => {
                let purged = live.take().map_or(0, |store| store.entries.len());
                info!(target: "playerstats::share", purged, "stat sharing disabled");
            }
            _ => {
                debug!(target: "playerstats::share", enabled, cooldown_minutes, "sharing settings refreshed");
            }
        }
    }

    /// Whether sharing is enabled
    pub fn is_enabled(&self) -> bool {
        self.live.read().is_some()
    }

    /// Configured cooldown in minutes
    pub fn cooldown_minutes(&self) -> u32 {
        self.cooldown_minutes.load(Ordering::SeqCst)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.live
            .read()
            .as_ref()
            .map_or(0, |store| store.entries.len())
    }

    /// Check if no entries are live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the live entry stored under `code`
    pub fn peek(&self, code: &ShareCode) -> Option<SharedResultEntry> {
        let live = self.live.read();
        let entry = live.as_ref()?.entries.get(code)?.clone();
        Some(entry)
    }

    /// Sequence numbers of `owner`'s live entries, oldest first
    pub fn owner_sequences(&self, owner: &str) -> Vec<u64> {
        let live = self.live.read();
        live.as_ref()
            .and_then(|store| {
                store
                    .by_owner
                    .get(&owner_key(owner))
                    .map(|owned| owned.keys().copied().collect())
            })
            .unwrap_or_default()
    }

    /// Number of `owner`'s live entries
    pub fn owner_entry_count(&self, owner: &str) -> usize {
        self.owner_sequences(owner).len()
    }
}
