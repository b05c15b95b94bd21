//! Stat request types
//!
//! A [`ComputeRequest`] holds everything the engine needs to perform one
//! lookup: who asked, which statistic, which optional sub-statistic, and
//! what the lookup targets. Whether the sub-statistic matches the
//! statistic's shape is checked by the calculator, not here.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a lookup is computed over
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// One player's value, looked up by exact name
    Player(String),
    /// The total over every player in the dataset
    Server,
    /// The ranked top list
    Top,
}

impl Target {
    /// Short label used in job names and logs
    pub fn label(&self) -> &'static str {
        match self {
            Target::Player(_) => "player",
            Target::Server => "server",
            Target::Top => "top",
        }
    }
}

/// Material/entity selector for statistics that need one
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubStatistic {
    /// A block material (e.g. `mine_block` → `diamond_ore`)
    Block(String),
    /// An item material (e.g. `use_item` → `bow`)
    Item(String),
    /// An entity type (e.g. `kill_entity` → `zombie`)
    Entity(String),
}

impl fmt::Display for SubStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubStatistic::Block(name) | SubStatistic::Item(name) | SubStatistic::Entity(name) => {
                f.write_str(name)
            }
        }
    }
}

/// Where a requester reads output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequesterKind {
    /// The server console: no share codes, no advisory error notices
    Console,
    /// A connected player
    Interactive,
}

/// Identity of whoever submitted a request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requester {
    /// Requester name (also the share-cache owner name)
    pub name: String,
    /// Console or interactive
    pub kind: RequesterKind,
}

impl Requester {
    /// An interactive requester (a player)
    pub fn player(name: impl Into<String>) -> Self {
        Requester {
            name: name.into(),
            kind: RequesterKind::Interactive,
        }
    }

    /// The console requester
    pub fn console() -> Self {
        Requester {
            name: "Console".to_string(),
            kind: RequesterKind::Console,
        }
    }

    /// True for the console
    pub fn is_console(&self) -> bool {
        self.kind == RequesterKind::Console
    }
}

/// One stat lookup
///
/// # Example
///
/// ```
/// use playerstats_core::{ComputeRequest, Requester, SubStatistic, Target};
///
/// let request = ComputeRequest::top(Requester::player("Alex"), "mine_block")
///     .with_sub_statistic(SubStatistic::Block("diamond_ore".into()));
/// assert_eq!(request.target, Target::Top);
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeRequest {
    /// What the lookup is computed over
    pub target: Target,
    /// Statistic name (e.g. `play_one_minute`)
    pub statistic: String,
    /// Optional material/entity selector
    pub sub_statistic: Option<SubStatistic>,
    /// Who asked
    pub requester: Requester,
}

impl ComputeRequest {
    /// Lookup for a single player
    pub fn player(
        requester: Requester,
        statistic: impl Into<String>,
        player_name: impl Into<String>,
    ) -> Self {
        Self::new(requester, statistic, Target::Player(player_name.into()))
    }

    /// Server-wide total
    pub fn server(requester: Requester, statistic: impl Into<String>) -> Self {
        Self::new(requester, statistic, Target::Server)
    }

    /// Ranked top list
    pub fn top(requester: Requester, statistic: impl Into<String>) -> Self {
        Self::new(requester, statistic, Target::Top)
    }

    fn new(requester: Requester, statistic: impl Into<String>, target: Target) -> Self {
        ComputeRequest {
            target,
            statistic: statistic.into(),
            sub_statistic: None,
            requester,
        }
    }

    /// Attach a material/entity selector
    pub fn with_sub_statistic(mut self, sub: SubStatistic) -> Self {
        self.sub_statistic = Some(sub);
        self
    }

    /// Reject requests that cannot be dispatched at all
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRequest` when the requester, the statistic or
    /// the player name of a player lookup is empty.
    pub fn validate(&self) -> Result<()> {
        if self.requester.name.trim().is_empty() {
            return Err(Error::invalid_request("requester name is empty"));
        }
        if self.statistic.trim().is_empty() {
            return Err(Error::invalid_request("no statistic was given"));
        }
        if let Target::Player(name) = &self.target {
            if name.trim().is_empty() {
                return Err(Error::invalid_request("no player name was given"));
            }
        }
        Ok(())
    }
}
