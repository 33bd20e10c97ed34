//! Window delta resolver.
//!
//! The vendor table has no row identity, no insertion point and no diff
//! API. Between two observations the resolver only knows the previous data
//! row count, a fingerprint of the previous first row, and the previous
//! filter fingerprint. From those it decides which contiguous sub-range of
//! the current snapshot is new:
//!
//! ```text
//! filter changed                      -> Reset  [0, N)
//! N == 0                              -> NoOp
//! first observation (previous == 0)   -> Delta  [0, N)          Initial
//! first row changed, N > previous     -> Delta  [0, N - prev)   Prepended
//! first row same,    N > previous     -> Delta  [prev, N)       Appended
//! first row same,    N == previous    -> NoOp
//! N < previous                        -> Reset  [0, N)          Shrunk
//! first row changed, N == previous    -> Reset  [0, N)          Unclassifiable
//! ```
//!
//! The heuristic assumes growth between two observations happens at one
//! end only and never reorders rows already seen. Observations that break
//! that assumption in a detectable way fall back to a full reset.
//!
//! A row the host has not finished rendering (blank timestamp or message)
//! is not consumed: the driver calls [`WindowDeltaResolver::defer_from`]
//! and the next observation offers it again.

use std::fmt;
use std::ops::Range;

use logdeck_core::{FilterFingerprint, RowFingerprint};

/// What the resolver remembers between observations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconciliationState {
    pub previous_row_count: usize,
    pub previous_first_fingerprint: RowFingerprint,
    /// `None` until the first observation of the session.
    pub previous_filter: Option<FilterFingerprint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Growth {
    Initial,
    Appended,
    Prepended,
}

impl Growth {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Appended => "appended",
            Self::Prepended => "prepended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetCause {
    FilterChanged,
    Shrunk,
    Unclassifiable,
}

impl ResetCause {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::FilterChanged => "filter_changed",
            Self::Shrunk => "shrunk",
            Self::Unclassifiable => "unclassifiable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowDelta {
    NoOp,
    Reset { cause: ResetCause, range: Range<usize> },
    Delta { range: Range<usize>, growth: Growth },
}

impl WindowDelta {
    /// Rows of the snapshot to process, if any.
    #[must_use]
    pub fn range(&self) -> Option<Range<usize>> {
        match self {
            Self::NoOp => None,
            Self::Reset { range, .. } | Self::Delta { range, .. } => Some(range.clone()),
        }
    }

    #[must_use]
    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset { .. })
    }
}

impl fmt::Display for WindowDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp => f.write_str("noop"),
            Self::Reset { cause, range } => {
                write!(f, "reset({}) [{}, {})", cause.label(), range.start, range.end)
            }
            Self::Delta { range, growth } => {
                write!(f, "{} [{}, {})", growth.label(), range.start, range.end)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WindowDeltaResolver {
    state: ReconciliationState,
}

impl WindowDeltaResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_state(state: ReconciliationState) -> Self {
        Self { state }
    }

    #[must_use]
    pub fn state(&self) -> &ReconciliationState {
        &self.state
    }

    /// Whether `filter` differs from the last observed filter. A session that
    /// has not observed anything yet counts as changed.
    #[must_use]
    pub fn filter_changed(&self, filter: &FilterFingerprint) -> bool {
        self.state.previous_filter.as_ref() != Some(filter)
    }

    /// Classify one observation and commit it to the state. The caller
    /// processes the returned range synchronously before the next call, so
    /// committing here is equivalent to committing after processing.
    pub fn resolve(
        &mut self,
        filter: &FilterFingerprint,
        row_count: usize,
        first_fingerprint: RowFingerprint,
    ) -> WindowDelta {
        match &self.state.previous_filter {
            Some(previous) if previous != filter => {
                self.state = ReconciliationState {
                    previous_row_count: row_count,
                    previous_first_fingerprint: first_fingerprint,
                    previous_filter: Some(filter.clone()),
                };
                return WindowDelta::Reset {
                    cause: ResetCause::FilterChanged,
                    range: 0..row_count,
                };
            }
            Some(_) => {}
            None => self.state.previous_filter = Some(filter.clone()),
        }

        if row_count == 0 {
            return WindowDelta::NoOp;
        }

        let previous = self.state.previous_row_count;
        let first_changed = first_fingerprint != self.state.previous_first_fingerprint;
        let delta = if previous == 0 {
            WindowDelta::Delta {
                range: 0..row_count,
                growth: Growth::Initial,
            }
        } else if row_count < previous {
            WindowDelta::Reset {
                cause: ResetCause::Shrunk,
                range: 0..row_count,
            }
        } else if first_changed {
            if row_count > previous {
                WindowDelta::Delta {
                    range: 0..row_count - previous,
                    growth: Growth::Prepended,
                }
            } else {
                WindowDelta::Reset {
                    cause: ResetCause::Unclassifiable,
                    range: 0..row_count,
                }
            }
        } else if row_count > previous {
            WindowDelta::Delta {
                range: previous..row_count,
                growth: Growth::Appended,
            }
        } else {
            return WindowDelta::NoOp;
        };

        self.state.previous_row_count = row_count;
        self.state.previous_first_fingerprint = first_fingerprint;
        delta
    }

    /// Pull the committed row count back to `row` so the next observation
    /// offers the rows from there on again. The driver calls this when a
    /// row inside `delta`'s range was still blank. Prepended ranges are left
    /// alone: their count measures the already seen tail. Returns whether
    /// the state moved.
    pub fn defer_from(&mut self, delta: &WindowDelta, row: usize) -> bool {
        let deferrable = match delta {
            WindowDelta::NoOp => false,
            WindowDelta::Delta { growth, .. } => *growth != Growth::Prepended,
            WindowDelta::Reset { .. } => true,
        };
        if !deferrable || row >= self.state.previous_row_count {
            return false;
        }
        self.state.previous_row_count = row;
        true
    }
}
