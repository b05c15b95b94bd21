//! Core types for playerstats
//!
//! This module defines the foundational identifier and dataset types:
//! - PlayerId: stable identifier of a known player
//! - ShareCode: token entitling one redemption of a shared result
//! - KnownPlayer: one candidate of the source collection scanned on reload
//! - ReferenceDataset: immutable name → id snapshot read by calculations
//! - DebugLevel: logging verbosity selected in the configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a player
///
/// A PlayerId is a wrapper around a UUID. It is stable across reloads for
/// the same player and globally unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Create a new random PlayerId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a PlayerId from a string representation
    ///
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque token handed out when a result is stored for sharing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShareCode(Uuid);

impl ShareCode {
    /// Mint a fresh random share code
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a share code typed back by a requester
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for ShareCode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A player as reported by the player directory
///
/// `name` is absent for players the directory never resolved a name for;
/// such players cannot be looked up by name and are skipped on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownPlayer {
    /// Display name, case-sensitive
    pub name: Option<String>,
    /// Stable identifier
    pub id: PlayerId,
    /// Last time the player was seen, if known
    pub last_played: Option<DateTime<Utc>>,
}

impl KnownPlayer {
    /// Create a named player with no recorded activity
    pub fn new(name: impl Into<String>, id: PlayerId) -> Self {
        KnownPlayer {
            name: Some(name.into()),
            id,
            last_played: None,
        }
    }

    /// Set the last-played timestamp
    pub fn with_last_played(mut self, at: DateTime<Utc>) -> Self {
        self.last_played = Some(at);
        self
    }
}

/// Immutable mapping from player name to player id
///
/// Produced once per reload and never mutated afterwards. A reload replaces
/// the whole dataset by re-pointing the shared `Arc`, so a reader always
/// holds one complete version.
///
/// # Example
///
/// ```
/// use playerstats_core::{PlayerId, ReferenceDataset};
/// use std::collections::HashMap;
///
/// let id = PlayerId::new();
/// let dataset = ReferenceDataset::new(HashMap::from([("Steve".to_string(), id)]));
/// assert_eq!(dataset.get("Steve"), Some(id));
/// assert_eq!(dataset.get("steve"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceDataset {
    entries: HashMap<String, PlayerId>,
}

impl ReferenceDataset {
    /// Freeze a fully built mapping into a dataset
    pub fn new(entries: HashMap<String, PlayerId>) -> Self {
        ReferenceDataset { entries }
    }

    /// Create an empty dataset (the state before the first reload)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a player id by exact name
    pub fn get(&self, name: &str) -> Option<PlayerId> {
        self.entries.get(name).copied()
    }

    /// Check whether a name is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of players in the dataset
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all player names (unordered)
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over all (name, id) pairs (unordered)
    pub fn iter(&self) -> impl Iterator<Item = (&str, PlayerId)> {
        self.entries.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

/// Logging verbosity
///
/// - Low: only unexpected errors and the main lifecycle messages
/// - Medium: every handled exception, main tasks and their timings
/// - High: every task and its timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    /// Lifecycle messages and errors
    #[default]
    Low,
    /// Main tasks with timings
    Medium,
    /// Everything
    High,
}

impl fmt::Display for DebugLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DebugLevel::Low => "low",
            DebugLevel::Medium => "medium",
            DebugLevel::High => "high",
        };
        f.write_str(name)
    }
}
