// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Timeout-bounded polling
//!
//! [`Poller`] hands out scan passes separated by a fixed delay until a
//! wall-clock budget is spent. The wait between passes is a Tokio sleep, so a
//! polling request never blocks the worker serving other requests, and
//! dropping the poller abandons the loop.
//!
//! ```no_run
//! use rust_tanklevel::cache::retry::{PollSchedule, Poller};
//! use std::time::Duration;
//!
//! # async fn run() {
//! let mut poller = Poller::start(PollSchedule::new(
//!     Duration::from_secs(15),
//!     Duration::from_millis(100),
//! ));
//! while poller.next_pass().await {
//!     // scan, and break once converged
//! }
//! # }
//! ```

use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Budget and cadence of a polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Total wall-clock time after which no further pass starts.
    pub max_wait: Duration,
    /// Delay between two consecutive passes.
    pub interval: Duration,
}

impl PollSchedule {
    pub fn new(max_wait: Duration, interval: Duration) -> Self {
        Self { max_wait, interval }
    }
}

/// Stateful pass counter for a [`PollSchedule`].
#[derive(Debug)]
pub struct Poller {
    schedule: PollSchedule,
    started_at: Instant,
    passes: u32,
}

impl Poller {
    /// Start the clock. The first pass is granted immediately.
    pub fn start(schedule: PollSchedule) -> Self {
        Self {
            schedule,
            started_at: Instant::now(),
            passes: 0,
        }
    }

    /// Wait for the next pass.
    ///
    /// Returns `false` once the budget is spent; the first call always
    /// returns `true` without waiting.
    pub async fn next_pass(&mut self) -> bool {
        if self.passes > 0 {
            if self.started_at.elapsed() >= self.schedule.max_wait {
                return false;
            }
            sleep(self.schedule.interval).await;
            if self.started_at.elapsed() >= self.schedule.max_wait {
                return false;
            }
        }
        self.passes += 1;
        true
    }

    /// Number of passes granted so far.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
