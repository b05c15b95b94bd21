//! Result sharing for playerstats
//!
//! A requester who computed a statistic can later broadcast that exact
//! result to everyone by redeeming a one-time share code.
//!
//! - ShareCache: per-owner quota, one-time redemption, redeemer cooldowns
//! - RedeemedLedger: bounded memory of codes that were already redeemed

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod ledger;

pub use cache::{Redemption, ShareCache, SharedResultEntry};
pub use ledger::RedeemedLedger;
