//! Rolling calculation-time tracker
//!
//! Stat requests look at how long recent calculations took to decide
//! whether to tell the requester to wait. The tracker keeps the last
//! `window` durations and averages them.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// How long the next calculation is expected to take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitEstimate {
    /// Below the notice threshold
    Quick,
    /// Above the notice threshold
    Short,
    /// Above the long-wait threshold
    Long,
}

/// Keeps the most recent calculation durations
#[derive(Debug)]
pub struct CalcTimeTracker {
    window: usize,
    samples: Mutex<VecDeque<Duration>>,
}

impl CalcTimeTracker {
    /// Track the last `window` durations (at least one)
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        CalcTimeTracker {
            window,
            samples: Mutex::new(VecDeque::with_capacity(window)),
        }
    }

    /// Record one calculation's duration, dropping the oldest if full
    pub fn record(&self, elapsed: Duration) {
        let mut samples = self.samples.lock();
        if samples.len() == self.window {
            samples.pop_front();
        }
        samples.push_back(elapsed);
    }

    /// Average of the recorded durations, `None` before the first record
    pub fn average(&self) -> Option<Duration> {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return None;
        }
        let total: Duration = samples.iter().sum();
        Some(total / samples.len() as u32)
    }

    /// Most recently recorded duration
    pub fn last(&self) -> Option<Duration> {
        self.samples.lock().back().copied()
    }

    /// Classify the expected wait against two thresholds
    ///
    /// Thresholds are exclusive: an average equal to `notice_after` is
    /// still `Quick`.
    pub fn estimate(&self, notice_after: Duration, long_after: Duration) -> WaitEstimate {
        match self.average() {
            Some(avg) if avg > long_after => WaitEstimate::Long,
            Some(avg) if avg > notice_after => WaitEstimate::Short,
            _ => WaitEstimate::Quick,
        }
    }
}
