//! logdeck-reconcile: incremental reconciliation of an externally mutated
//! log table into a deduplicated, ordered record stream.
//!
//! The engine is single-threaded and synchronous. One
//! [`driver::ReconciliationDriver`] exclusively owns the state for one
//! mounted view, so cycles are serialized by `&mut self` and no locking is
//! involved.

pub mod driver;
pub mod host;
pub mod merge_buffer;
pub mod session;
pub mod trigger;
pub mod window_delta;

pub use driver::{CycleOutcome, CycleReport, ReconciliationDriver};
pub use host::{
    trim_structural, CollectingSink, HostError, HostView, InMemoryHost, RecordSink, RowHandle,
    StaticRow,
};
pub use merge_buffer::{MergeBuffer, MergeOutcome, Placement};
pub use session::{OverlaySession, PumpOutcome};
pub use trigger::{FilterPoll, MutationCoalescer, NotifyEvent};
pub use window_delta::{Growth, ReconciliationState, ResetCause, WindowDelta, WindowDeltaResolver};
