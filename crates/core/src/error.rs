//! Error types for playerstats
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Only a few variants are ever shown to a requester; the engine turns
//! `ConcurrentModification` into an advisory notice and propagates the rest.

use std::io;
use thiserror::Error;

/// Result type alias for playerstats operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the playerstats engine
#[derive(Debug, Error)]
pub enum Error {
    /// A job was interrupted while blocked joining another job.
    ///
    /// Fatal to the interrupted cycle. Never retried.
    #[error("Job '{0}' was interrupted while waiting")]
    Interrupted(String),

    /// A job panicked before producing an outcome
    #[error("Job '{0}' panicked")]
    JobPanicked(String),

    /// The request handed to the engine is malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The dataset changed structurally while a calculation was reading it
    #[error("Dataset was modified during calculation")]
    ConcurrentModification,

    /// Stat sharing is turned off in the configuration
    #[error("Stat sharing is disabled")]
    SharingDisabled,

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A collaborator (calculator, directory, formatter, sink) failed
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// I/O error (config file, thread spawn, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Internal invariant broken
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an `InvalidRequest` error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Error::InvalidRequest(msg.into())
    }

    /// Create a `Config` error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a `Collaborator` error
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Error::Collaborator(msg.into())
    }

    /// Create an `Internal` error
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// True if this error ends the current cycle without being retried
    /// and must reach the caller unchanged.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Interrupted(_) | Error::JobPanicked(_))
    }
}
