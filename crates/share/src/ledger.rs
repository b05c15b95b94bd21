//! Ledger of recently redeemed share codes
//!
//! A bounded ring that answers one question: "was this code redeemed
//! already?". Codes age out by capacity, never by time.
//!
//! When an insertion finds the ring full, the ring is compacted to its most
//! recent `retained` codes and the insertion is retried once. Both steps
//! happen under one lock, so a concurrent `contains` never observes the
//! ring half-compacted.

use parking_lot::Mutex;
use playerstats_core::ShareCode;
use std::collections::VecDeque;
use tracing::debug;

/// Bounded ring of redeemed codes
#[derive(Debug)]
pub struct RedeemedLedger {
    capacity: usize,
    retained: usize,
    ring: Mutex<VecDeque<ShareCode>>,
}

impl RedeemedLedger {
    /// Create a ledger holding up to `capacity` codes that keeps the last
    /// `retained` on compaction
    ///
    /// `capacity` is at least 1 and `retained` is below `capacity`.
    pub fn new(capacity: usize, retained: usize) -> Self {
        let capacity = capacity.max(1);
        let retained = retained.min(capacity - 1);
        RedeemedLedger {
            capacity,
            retained,
            ring: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Remember a redeemed code
    pub fn record(&self, code: ShareCode) {
        let mut ring = self.ring.lock();
        if Self::offer(&mut ring, self.capacity, code) {
            return;
        }

        let dropped = ring.len() - self.retained;
        ring.drain(..dropped);
        debug!(
            target: "playerstats::share",
            dropped,
            kept = ring.len(),
            "compacted redeemed-code ledger"
        );

        let accepted = Self::offer(&mut ring, self.capacity, code);
        debug_assert!(accepted, "compacted ledger must accept one code");
    }

    fn offer(ring: &mut VecDeque<ShareCode>, capacity: usize, code: ShareCode) -> bool {
        if ring.len() >= capacity {
            return false;
        }
        ring.push_back(code);
        true
    }

    /// Check whether a code is among the remembered ones
    pub fn contains(&self, code: &ShareCode) -> bool {
        self.ring.lock().contains(code)
    }

    /// Number of remembered codes
    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    /// Check if nothing was redeemed yet (or everything aged out)
    pub fn is_empty(&self) -> bool {
        self.ring.lock().is_empty()
    }

    /// Maximum number of remembered codes
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
