//! Concurrency layer for playerstats
//!
//! This crate implements the reload/stat mutual-exclusion protocol:
//! - Job, JobHandle: named threads with blocking, interruptible joins
//! - InlineJob: a stat job running on the caller's thread, joinable like the rest
//! - JobBook: admission of new jobs and capture of the jobs they must join
//! - CalcTimeTracker: rolling average used for "this may take a while"
//!
//! There is no lock shared between a running reload and a running stat
//! job. Each side joins the jobs of the other kind that were admitted
//! before it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod book;
pub mod job;
pub mod timing;

pub use book::{JobBook, Prerequisites};
pub use job::{InlineJob, Job, JobHandle};
pub use timing::{CalcTimeTracker, WaitEstimate};
