//! Reconciliation driver.
//!
//! Owns the resolver state, the merge buffer and the color table for one
//! mounted log view, and runs one synchronous cycle per trigger:
//!
//! ```text
//! read filter -> read snapshot once -> trim structural rows
//!   -> resolve window delta -> parse rows in range -> color usernames
//!   -> merge (or replace on reset) -> deliver
//! ```
//!
//! Every anomaly degrades to skipping a row, a batch or a cycle; the next
//! observation self-heals.

use logdeck_core::{
    parse_row, FilterFingerprint, LogRecord, RecordId, ReconcileConfig, RowFingerprint,
    UsernameColorTable,
};
use tracing::{debug, trace};

use crate::host::{trim_structural, HostView, RecordSink, RowHandle};
use crate::merge_buffer::{MergeBuffer, MergeOutcome, Placement};
use crate::window_delta::{ReconciliationState, WindowDelta, WindowDeltaResolver};

/// Counters for one cycle that reached the parse stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub delta: WindowDelta,
    pub parsed: usize,
    pub rejected: usize,
    pub added: usize,
    pub duplicates: usize,
    pub placement: Option<Placement>,
    /// Snapshot index of the first still-blank row, when the resolver was
    /// pulled back to offer it again.
    pub deferred_from: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The host table or filter controls could not be read.
    SourceUnavailable,
    /// Filter poll found nothing to do.
    FilterUnchanged,
    NoOp,
    /// Batch belonged to an unexpected service; nothing delivered.
    Discarded { service: String, report: CycleReport },
    /// Every row in range was malformed or already seen; nothing delivered.
    Unchanged(CycleReport),
    Delivered(CycleReport),
}

impl CycleOutcome {
    #[must_use]
    pub fn delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::SourceUnavailable => "source_unavailable",
            Self::FilterUnchanged => "filter_unchanged",
            Self::NoOp => "noop",
            Self::Discarded { .. } => "discarded",
            Self::Unchanged(_) => "unchanged",
            Self::Delivered(_) => "delivered",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReconciliationDriver {
    config: ReconcileConfig,
    resolver: WindowDeltaResolver,
    buffer: MergeBuffer,
    colors: UsernameColorTable,
}

impl ReconciliationDriver {
    #[must_use]
    pub fn new(config: ReconcileConfig) -> Self {
        let buffer = MergeBuffer::new(config.allowed_services.clone());
        Self {
            config,
            resolver: WindowDeltaResolver::new(),
            buffer,
            colors: UsernameColorTable::new(),
        }
    }

    #[must_use]
    pub fn records(&self) -> &[LogRecord] {
        self.buffer.records()
    }

    #[must_use]
    pub fn colors(&self) -> &UsernameColorTable {
        &self.colors
    }

    #[must_use]
    pub fn state(&self) -> &ReconciliationState {
        self.resolver.state()
    }

    /// The host signalled that its row collection may have changed.
    pub fn on_collection_changed<H, S>(&mut self, host: &H, sink: &mut S) -> CycleOutcome
    where
        H: HostView,
        S: RecordSink + ?Sized,
    {
        let filter = match host.read_filter_fingerprint() {
            Ok(filter) => filter,
            Err(err) => {
                debug!(error = %err, "skipping cycle");
                return CycleOutcome::SourceUnavailable;
            }
        };
        self.run_cycle(host, &filter, sink)
    }

    /// Periodic filter poll. Runs a cycle only when the filter moved, since
    /// the filter controls emit no change notification of their own.
    pub fn on_filter_tick<H, S>(&mut self, host: &H, sink: &mut S) -> CycleOutcome
    where
        H: HostView,
        S: RecordSink + ?Sized,
    {
        let filter = match host.read_filter_fingerprint() {
            Ok(filter) => filter,
            Err(err) => {
                debug!(error = %err, "skipping filter poll");
                return CycleOutcome::SourceUnavailable;
            }
        };
        if !self.resolver.filter_changed(&filter) {
            return CycleOutcome::FilterUnchanged;
        }
        debug!(filter = %filter, "filter changed");
        self.run_cycle(host, &filter, sink)
    }

    /// Flip one record's detail flag and re-deliver.
    pub fn toggle_detail<S>(&mut self, id: &RecordId, sink: &mut S) -> Option<bool>
    where
        S: RecordSink + ?Sized,
    {
        let expanded = self.buffer.toggle_detail(id)?;
        sink.records_updated(self.buffer.records(), &self.colors);
        Some(expanded)
    }

    fn run_cycle<H, S>(&mut self, host: &H, filter: &FilterFingerprint, sink: &mut S) -> CycleOutcome
    where
        H: HostView,
        S: RecordSink + ?Sized,
    {
        let snapshot = match host.read_row_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                debug!(error = %err, "skipping cycle");
                return CycleOutcome::SourceUnavailable;
            }
        };
        let rows = trim_structural(
            &snapshot,
            self.config.leading_structural_rows,
            self.config.trailing_structural_rows,
        );

        let first = rows
            .first()
            .map(|row| {
                RowFingerprint::of_row(
                    row.timestamp_text().as_deref(),
                    row.message_text().as_deref(),
                )
            })
            .unwrap_or_default();
        let delta = self.resolver.resolve(filter, rows.len(), first);
        self.buffer.note_row_count(rows.len());

        let Some(range) = delta.range() else {
            trace!(rows = rows.len(), "no new rows");
            return CycleOutcome::NoOp;
        };

        let start = range.start;
        let (batch, rejected, first_blank) = self.parse_rows(&rows[range]);
        let parsed = batch.len();
        let is_reset = delta.is_reset();
        let outcome = if is_reset {
            self.buffer.replace(batch)
        } else {
            self.buffer.merge(batch)
        };

        // Allow-list drops are final; blank rows are offered again.
        let deferred_from = match (&outcome, first_blank) {
            (MergeOutcome::Discarded { .. }, _) | (_, None) => None,
            (_, Some(offset)) => {
                let row = start + offset;
                self.resolver.defer_from(&delta, row).then(|| {
                    debug!(row, delta = %delta, "row not rendered yet; deferring");
                    row
                })
            }
        };

        let mut report = CycleReport {
            delta,
            parsed,
            rejected,
            added: 0,
            duplicates: 0,
            placement: if is_reset {
                Some(Placement::Replaced)
            } else {
                None
            },
            deferred_from,
        };
        let result = match outcome {
            MergeOutcome::Integrated {
                placement,
                added,
                duplicates,
            } => {
                report.placement = Some(placement);
                report.added = added;
                report.duplicates = duplicates;
                CycleOutcome::Delivered(report)
            }
            // A reset already emptied the buffer; the view must hear about it
            // even when the replacement batch is unusable.
            MergeOutcome::Empty { duplicates } => {
                report.duplicates = duplicates;
                if is_reset {
                    CycleOutcome::Delivered(report)
                } else {
                    CycleOutcome::Unchanged(report)
                }
            }
            MergeOutcome::Discarded { service } => {
                if is_reset {
                    CycleOutcome::Delivered(report)
                } else {
                    CycleOutcome::Discarded { service, report }
                }
            }
        };

        if let CycleOutcome::Delivered(report) = &result {
            debug!(
                delta = %report.delta,
                added = report.added,
                rejected = report.rejected,
                duplicates = report.duplicates,
                total = self.buffer.len(),
                "delivering records"
            );
            sink.records_updated(self.buffer.records(), &self.colors);
        }
        result
    }

    /// Parse `rows` in order. Returns the records, the rejection count and
    /// the offset of the first row the host had not finished rendering.
    fn parse_rows<R: RowHandle>(&mut self, rows: &[R]) -> (Vec<LogRecord>, usize, Option<usize>) {
        let mut batch = Vec::with_capacity(rows.len());
        let mut rejected = 0usize;
        let mut first_blank = None;
        for (offset, row) in rows.iter().enumerate() {
            let timestamp = row.timestamp_text();
            let message = row.message_text();
            match parse_row(timestamp.as_deref(), message.as_deref()) {
                Ok(record) => {
                    if let Some(username) = record.username() {
                        let _ = self.colors.color_for(username);
                    }
                    batch.push(record);
                }
                Err(rejection) => {
                    rejected += 1;
                    if rejection.is_unrendered() && first_blank.is_none() {
                        first_blank = Some(offset);
                    }
                    trace!(reason = rejection.kind(), "skipping malformed row");
                }
            }
        }
        (batch, rejected, first_blank)
    }
}
