//! Host seam: how the engine observes the vendor view and where it delivers.
//!
//! The host is unreliable by nature. Rows may be half rendered, the table
//! may not exist yet, and two sequential reads may disagree, so every
//! cycle reads the snapshot exactly once.

use logdeck_core::{FilterFingerprint, LogRecord, UsernameColorTable};

/// One opaque vendor row.
pub trait RowHandle {
    fn timestamp_text(&self) -> Option<String>;
    fn message_text(&self) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("host source unavailable: {what}")]
    SourceUnavailable { what: String },
}

impl HostError {
    #[must_use]
    pub fn unavailable(what: &str) -> Self {
        Self::SourceUnavailable {
            what: what.to_string(),
        }
    }
}

/// Read-only view of the vendor log table.
pub trait HostView {
    type Row: RowHandle;

    /// Full ordered row collection, structural rows included.
    fn read_row_snapshot(&self) -> Result<Vec<Self::Row>, HostError>;

    fn read_filter_fingerprint(&self) -> Result<FilterFingerprint, HostError>;

    /// Whether the page still shows a log view the overlay belongs on.
    fn matches_log_view(&self) -> bool {
        true
    }
}

/// Presentation-side consumer of the reconciled stream.
pub trait RecordSink {
    fn records_updated(&mut self, records: &[LogRecord], colors: &UsernameColorTable);
}

/// Drop the structural rows at either end of a snapshot. Snapshots shorter
/// than the structural rows yield no data rows.
#[must_use]
pub fn trim_structural<R>(rows: &[R], leading: usize, trailing: usize) -> &[R] {
    let end = rows.len().saturating_sub(trailing);
    if leading >= end {
        return &[];
    }
    &rows[leading..end]
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StaticRow {
    pub timestamp: Option<String>,
    pub message: Option<String>,
}

impl StaticRow {
    #[must_use]
    pub fn new(timestamp: &str, message: &str) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            message: Some(message.to_string()),
        }
    }

    /// A row the vendor has not finished rendering.
    #[must_use]
    pub fn blank() -> Self {
        Self::default()
    }
}

impl RowHandle for StaticRow {
    fn timestamp_text(&self) -> Option<String> {
        self.timestamp.clone()
    }

    fn message_text(&self) -> Option<String> {
        self.message.clone()
    }
}

/// Scriptable host used by tests and the replay command. Rows are stored as
/// data rows; the configured number of structural rows is added around them
/// on every read so trimming is exercised the same way as against a real
/// vendor table.
#[derive(Debug, Clone)]
pub struct InMemoryHost {
    rows: Vec<StaticRow>,
    filter: FilterFingerprint,
    leading_structural: usize,
    trailing_structural: usize,
    available: bool,
    log_view: bool,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            filter: FilterFingerprint::default(),
            leading_structural: 0,
            trailing_structural: 0,
            available: true,
            log_view: true,
        }
    }
}

impl InMemoryHost {
    #[must_use]
    pub fn with_rows(rows: Vec<StaticRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_structural_rows(mut self, leading: usize, trailing: usize) -> Self {
        self.leading_structural = leading;
        self.trailing_structural = trailing;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterFingerprint) -> Self {
        self.filter = filter;
        self
    }

    pub fn set_rows(&mut self, rows: Vec<StaticRow>) {
        self.rows = rows;
    }

    pub fn append_rows(&mut self, rows: Vec<StaticRow>) {
        self.rows.extend(rows);
    }

    pub fn prepend_rows(&mut self, rows: Vec<StaticRow>) {
        self.rows.splice(0..0, rows);
    }

    pub fn set_filter(&mut self, filter: FilterFingerprint) {
        self.filter = filter;
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn set_log_view(&mut self, log_view: bool) {
        self.log_view = log_view;
    }

    #[must_use]
    pub fn data_rows(&self) -> &[StaticRow] {
        &self.rows
    }
}

impl HostView for InMemoryHost {
    type Row = StaticRow;

    fn read_row_snapshot(&self) -> Result<Vec<StaticRow>, HostError> {
        if !self.available {
            return Err(HostError::unavailable("row container"));
        }
        let structural = StaticRow {
            timestamp: None,
            message: Some("Load more".to_string()),
        };
        let mut snapshot =
            Vec::with_capacity(self.rows.len() + self.leading_structural + self.trailing_structural);
        snapshot.extend(std::iter::repeat(structural.clone()).take(self.leading_structural));
        snapshot.extend(self.rows.iter().cloned());
        snapshot.extend(std::iter::repeat(structural).take(self.trailing_structural));
        Ok(snapshot)
    }

    fn read_filter_fingerprint(&self) -> Result<FilterFingerprint, HostError> {
        if !self.available {
            return Err(HostError::unavailable("filter controls"));
        }
        Ok(self.filter.clone())
    }

    fn matches_log_view(&self) -> bool {
        self.log_view
    }
}

/// Sink that keeps every delivery, for tests and replay output.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub deliveries: Vec<Vec<LogRecord>>,
    pub colors: UsernameColorTable,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&[LogRecord]> {
        self.deliveries.last().map(Vec::as_slice)
    }

    #[must_use]
    pub fn delivery_count(&self) -> usize {
        self.deliveries.len()
    }
}

impl RecordSink for CollectingSink {
    fn records_updated(&mut self, records: &[LogRecord], colors: &UsernameColorTable) {
        self.deliveries.push(records.to_vec());
        self.colors = colors.clone();
    }
}
