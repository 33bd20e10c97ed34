//! Mounted overlay session.
//!
//! Ties one [`ReconciliationDriver`] to one logical log view. The driver,
//! and with it the resolver state, merge buffer and color table, exists only
//! while the host matches the log-view condition.

use std::time::Instant;

use logdeck_core::ReconcileConfig;
use tracing::debug;

use crate::driver::{CycleOutcome, ReconciliationDriver};
use crate::host::{HostView, RecordSink};
use crate::trigger::{FilterPoll, MutationCoalescer, NotifyEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Nothing due.
    Idle,
    /// The host is not showing a log view and nothing is mounted.
    Detached,
    /// The host left the log view; session state was released.
    Unmounted,
    Cycle(CycleOutcome),
}

#[derive(Debug, Clone)]
pub struct OverlaySession {
    config: ReconcileConfig,
    driver: Option<ReconciliationDriver>,
    mutations: MutationCoalescer,
    filter_poll: FilterPoll,
}

impl OverlaySession {
    /// Create a session. Nothing is mounted until the first pump finds a log
    /// view.
    #[must_use]
    pub fn new(config: ReconcileConfig) -> Self {
        let mutations = MutationCoalescer::new(config.debounce);
        let filter_poll = FilterPoll::new(config.filter_poll_interval);
        Self {
            config,
            driver: None,
            mutations,
            filter_poll,
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.driver.is_some()
    }

    #[must_use]
    pub fn driver(&self) -> Option<&ReconciliationDriver> {
        self.driver.as_ref()
    }

    /// Host callback: the row collection may have changed.
    pub fn notify_mutation(&mut self, now: Instant) -> NotifyEvent {
        self.mutations.notify(now)
    }

    /// Run at most one reconciliation. Mutation triggers take precedence
    /// over the filter poll.
    pub fn pump<H, S>(&mut self, now: Instant, host: &H, sink: &mut S) -> PumpOutcome
    where
        H: HostView,
        S: RecordSink + ?Sized,
    {
        if !host.matches_log_view() {
            if self.driver.is_some() {
                self.unmount();
                return PumpOutcome::Unmounted;
            }
            return PumpOutcome::Detached;
        }

        if self.driver.is_none() {
            self.mount(now);
        }
        let Some(driver) = self.driver.as_mut() else {
            return PumpOutcome::Detached;
        };

        if self.mutations.take_due(now) {
            return PumpOutcome::Cycle(driver.on_collection_changed(host, sink));
        }
        if self.filter_poll.due(now) {
            return match driver.on_filter_tick(host, sink) {
                CycleOutcome::FilterUnchanged => PumpOutcome::Idle,
                outcome => PumpOutcome::Cycle(outcome),
            };
        }
        PumpOutcome::Idle
    }

    /// Release the driver and stop all timers.
    pub fn unmount(&mut self) {
        if self.driver.take().is_some() {
            debug!("overlay unmounted");
        }
        self.mutations.cancel();
        self.filter_poll.reset();
    }

    /// Attach a fresh driver and schedule the initial scrape. No-op when
    /// already mounted; `pump` mounts on its own once a log view appears.
    pub fn mount(&mut self, now: Instant) {
        if self.driver.is_some() {
            return;
        }
        debug!("overlay mounted");
        self.driver = Some(ReconciliationDriver::new(self.config.clone()));
        self.filter_poll.reset();
        // Initial scrape, as if the table had just mutated.
        let _ = self.mutations.notify(now);
    }
}
