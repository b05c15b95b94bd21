//! Stat result types
//!
//! The type parameter `T` of [`ComputeResult`] is the type of the stored
//! number:
//! - `i32` for a player lookup
//! - `i64` for a server total
//! - [`TopList`] for a top list
//!
//! The engine works with the erased [`StatValue`]; the typed accessors on
//! `ComputeResult<StatValue>` recover the concrete form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ranked (name, value) pairs, best first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopList(Vec<(String, i32)>);

impl TopList {
    /// Wrap pairs that are already in rank order
    pub fn new(ranked: Vec<(String, i32)>) -> Self {
        TopList(ranked)
    }

    /// Keep at most `size` leading entries
    pub fn truncate(&mut self, size: usize) {
        self.0.truncate(size);
    }

    /// Number of ranked entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entry at a 0-based rank
    pub fn get(&self, rank: usize) -> Option<(&str, i32)> {
        self.0.get(rank).map(|(name, value)| (name.as_str(), *value))
    }

    /// Iterate in rank order
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl FromIterator<(String, i32)> for TopList {
    fn from_iter<I: IntoIterator<Item = (String, i32)>>(iter: I) -> Self {
        TopList(iter.into_iter().collect())
    }
}

/// The number produced by one lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatValue {
    /// Player lookup
    Player(i32),
    /// Server total
    Server(i64),
    /// Top list
    Top(TopList),
}

/// Formatted output produced by the output formatter
///
/// Opaque to the engine: it is stored, shared and delivered as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormattedOutput(String);

impl FormattedOutput {
    /// Wrap formatted text
    pub fn new(text: impl Into<String>) -> Self {
        FormattedOutput(text.into())
    }

    /// The formatted text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormattedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a completed lookup: the raw value and its formatted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeResult<T = StatValue> {
    value: T,
    rendered: FormattedOutput,
}

impl<T> ComputeResult<T> {
    /// Pair a value with its rendering
    pub fn new(value: T, rendered: FormattedOutput) -> Self {
        ComputeResult { value, rendered }
    }

    /// The raw value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// The formatted message
    pub fn rendered(&self) -> &FormattedOutput {
        &self.rendered
    }

    /// Split into value and rendering
    pub fn into_parts(self) -> (T, FormattedOutput) {
        (self.value, self.rendered)
    }
}

impl ComputeResult<StatValue> {
    /// The value of a player lookup
    pub fn as_player(&self) -> Option<i32> {
        match self.value {
            StatValue::Player(v) => Some(v),
            _ => None,
        }
    }

    /// The value of a server lookup
    pub fn as_server(&self) -> Option<i64> {
        match self.value {
            StatValue::Server(v) => Some(v),
            _ => None,
        }
    }

    /// The value of a top-list lookup
    pub fn as_top(&self) -> Option<&TopList> {
        match &self.value {
            StatValue::Top(list) => Some(list),
            _ => None,
        }
    }
}
