//! Trigger scheduling: mutation-burst coalescing and the filter poll cadence.
//!
//! A single user action makes the vendor table fire many micro-mutations.
//! The coalescer collapses a burst into one pending trigger that fires once
//! the burst has been quiet for the debounce window. The filter controls
//! have no change notification, so they are polled on a fixed interval.

use std::time::{Duration, Instant};

const DEFAULT_FILTER_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyEvent {
    /// First notification of a new burst.
    Scheduled,
    /// Folded into an already pending trigger.
    Coalesced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationCoalescer {
    debounce: Duration,
    last_notified: Option<Instant>,
    coalesced_total: u64,
    fired_total: u64,
}

impl MutationCoalescer {
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_notified: None,
            coalesced_total: 0,
            fired_total: 0,
        }
    }

    pub fn notify(&mut self, now: Instant) -> NotifyEvent {
        let event = if self.last_notified.is_some() {
            self.coalesced_total = self.coalesced_total.saturating_add(1);
            NotifyEvent::Coalesced
        } else {
            NotifyEvent::Scheduled
        };
        self.last_notified = Some(now);
        event
    }

    /// True at most once per burst, once the burst has been quiet for the
    /// debounce window. A zero window fires on the first check.
    pub fn take_due(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_notified else {
            return false;
        };
        if now.saturating_duration_since(last) < self.debounce {
            return false;
        }
        self.last_notified = None;
        self.fired_total = self.fired_total.saturating_add(1);
        true
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.last_notified.is_some()
    }

    /// Drop any pending trigger.
    pub fn cancel(&mut self) {
        self.last_notified = None;
    }

    #[must_use]
    pub fn coalesced_total(&self) -> u64 {
        self.coalesced_total
    }

    #[must_use]
    pub fn fired_total(&self) -> u64 {
        self.fired_total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPoll {
    interval: Duration,
    next_due: Option<Instant>,
}

impl FilterPoll {
    /// A zero interval is replaced by the 500ms default.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            DEFAULT_FILTER_POLL_INTERVAL
        } else {
            interval
        };
        Self {
            interval,
            next_due: None,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when a poll is due; schedules the next one. The first check of a
    /// fresh schedule is always due.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(next) if now < next => false,
            _ => {
                self.next_due = Some(now + self.interval);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.next_due = None;
    }
}
