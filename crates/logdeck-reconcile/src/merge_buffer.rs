//! Merge buffer: the authoritative ordered record sequence.
//!
//! Placement is re-derived from content as a cross-check on the resolver:
//! a batch whose last timestamp is not after the buffer's first timestamp
//! is older and goes in front; anything else is appended.

use std::collections::HashSet;

use logdeck_core::config::service_allowed;
use logdeck_core::{LogRecord, RecordId};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    Appended,
    Prepended,
    Replaced,
}

impl Placement {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Appended => "appended",
            Self::Prepended => "prepended",
            Self::Replaced => "replaced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Integrated {
        placement: Placement,
        added: usize,
        duplicates: usize,
    },
    /// The batch's first record came from a service outside the allow-list.
    Discarded { service: String },
    /// Nothing left to integrate after dedup.
    Empty { duplicates: usize },
}

#[derive(Debug, Clone, Default)]
pub struct MergeBuffer {
    records: Vec<LogRecord>,
    seen: HashSet<String>,
    allowed_services: Vec<String>,
    last_row_count: usize,
}

impl MergeBuffer {
    #[must_use]
    pub fn new(allowed_services: Vec<String>) -> Self {
        Self {
            allowed_services,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    /// Record the latest observed data row count. A decrease means the vendor
    /// trimmed or rebuilt its own buffer, so the seen-set is stale.
    pub fn note_row_count(&mut self, row_count: usize) {
        if row_count < self.last_row_count && !self.seen.is_empty() {
            debug!(
                previous = self.last_row_count,
                current = row_count,
                "row count decreased; clearing seen-set"
            );
            self.seen.clear();
        }
        self.last_row_count = row_count;
    }

    /// Integrate a parsed batch (in source order) into the buffer.
    pub fn merge(&mut self, batch: Vec<LogRecord>) -> MergeOutcome {
        let Some(first) = batch.first() else {
            return MergeOutcome::Empty { duplicates: 0 };
        };
        if !service_allowed(&self.allowed_services, &first.metadata.service) {
            debug!(
                service = %first.metadata.service,
                size = batch.len(),
                "discarding batch from unexpected service"
            );
            return MergeOutcome::Discarded {
                service: first.metadata.service.clone(),
            };
        }

        let total = batch.len();
        let fresh = self.dedup(batch);
        let duplicates = total - fresh.len();
        if fresh.is_empty() {
            return MergeOutcome::Empty { duplicates };
        }

        let older = match (fresh.last(), self.records.first()) {
            (Some(incoming_last), Some(buffer_first)) => {
                incoming_last.timestamp <= buffer_first.timestamp
            }
            _ => false,
        };
        let added = fresh.len();
        let placement = if older {
            self.records.splice(0..0, fresh);
            Placement::Prepended
        } else {
            self.records.extend(fresh);
            Placement::Appended
        };
        trace!(placement = placement.label(), added, duplicates, "merged batch");

        MergeOutcome::Integrated {
            placement,
            added,
            duplicates,
        }
    }

    /// Discard everything and rebuild from `batch`.
    pub fn replace(&mut self, batch: Vec<LogRecord>) -> MergeOutcome {
        self.clear();
        match self.merge(batch) {
            MergeOutcome::Integrated {
                added, duplicates, ..
            } => MergeOutcome::Integrated {
                placement: Placement::Replaced,
                added,
                duplicates,
            },
            other => other,
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.seen.clear();
    }

    /// Flip the detail flag of one record. Returns the new value.
    pub fn toggle_detail(&mut self, id: &RecordId) -> Option<bool> {
        let record = self.records.iter_mut().find(|record| &record.id == id)?;
        record.is_detail_expanded = !record.is_detail_expanded;
        Some(record.is_detail_expanded)
    }

    fn dedup(&mut self, batch: Vec<LogRecord>) -> Vec<LogRecord> {
        batch
            .into_iter()
            .filter(|record| {
                let fresh = self.seen.insert(record.content_key.clone());
                if !fresh {
                    trace!(key = %record.content_key, "dropping duplicate record");
                }
                fresh
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{MergeBuffer, MergeOutcome, Placement};
    use chrono::{TimeZone, Utc};
    use logdeck_core::{LogRecord, RecordId, RecordMetadata};

    fn record(key: &str, second: u32, service: &str) -> LogRecord {
        LogRecord {
            id: RecordId::generate(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, second).unwrap(),
            display_time: format!("09:00:{second:02}"),
            level: Default::default(),
            message: key.to_string(),
            structured_payload: None,
            metadata: RecordMetadata {
                service: service.to_string(),
                ..RecordMetadata::default()
            },
            content_key: key.to_string(),
            is_detail_expanded: false,
        }
    }

    fn keys(buffer: &MergeBuffer) -> Vec<&str> {
        buffer
            .records()
            .iter()
            .map(|record| record.content_key.as_str())
            .collect()
    }

    #[test]
    fn newer_batch_is_appended() {
        let mut buffer = MergeBuffer::default();
        let _ = buffer.merge(vec![record("A", 1, "svc"), record("B", 2, "svc")]);
        let outcome = buffer.merge(vec![record("C", 3, "svc")]);
        assert_eq!(
            outcome,
            MergeOutcome::Integrated {
                placement: Placement::Appended,
                added: 1,
                duplicates: 0
            }
        );
        assert_eq!(keys(&buffer), vec!["A", "B", "C"]);
    }

    #[test]
    fn older_batch_is_prepended() {
        let mut buffer = MergeBuffer::default();
        let _ = buffer.merge(vec![record("B", 2, "svc"), record("C", 3, "svc")]);
        let outcome = buffer.merge(vec![record("A", 2, "svc")]);
        assert!(matches!(
            outcome,
            MergeOutcome::Integrated {
                placement: Placement::Prepended,
                ..
            }
        ));
        assert_eq!(keys(&buffer), vec!["A", "B", "C"]);
    }

    #[test]
    fn duplicate_keys_within_batch_collapse() {
        let mut buffer = MergeBuffer::default();
        let outcome = buffer.merge(vec![record("A", 1, "svc"), record("A", 1, "svc")]);
        assert_eq!(
            outcome,
            MergeOutcome::Integrated {
                placement: Placement::Appended,
                added: 1,
                duplicates: 1
            }
        );
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn already_seen_batch_is_empty() {
        let mut buffer = MergeBuffer::default();
        let _ = buffer.merge(vec![record("A", 1, "svc")]);
        assert_eq!(
            buffer.merge(vec![record("A", 1, "svc")]),
            MergeOutcome::Empty { duplicates: 1 }
        );
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn unexpected_service_discards_whole_batch() {
        let mut buffer = MergeBuffer::new(vec!["checkout".to_string()]);
        let outcome = buffer.merge(vec![record("A", 1, "ads"), record("B", 2, "checkout")]);
        assert_eq!(
            outcome,
            MergeOutcome::Discarded {
                service: "ads".to_string()
            }
        );
        assert!(buffer.is_empty());
        assert_eq!(buffer.seen_len(), 0);
    }

    #[test]
    fn replace_clears_previous_contents() {
        let mut buffer = MergeBuffer::default();
        let _ = buffer.merge(vec![record("A", 1, "svc"), record("B", 2, "svc")]);
        let outcome = buffer.replace(vec![record("X", 5, "svc"), record("A", 1, "svc")]);
        assert!(matches!(
            outcome,
            MergeOutcome::Integrated {
                placement: Placement::Replaced,
                added: 2,
                ..
            }
        ));
        assert_eq!(keys(&buffer), vec!["X", "A"]);
    }

    #[test]
    fn shrinking_row_count_clears_seen_set() {
        let mut buffer = MergeBuffer::default();
        buffer.note_row_count(2);
        let _ = buffer.merge(vec![record("A", 1, "svc"), record("B", 2, "svc")]);
        buffer.note_row_count(3);
        assert_eq!(buffer.seen_len(), 2);
        buffer.note_row_count(1);
        assert_eq!(buffer.seen_len(), 0);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn toggle_detail_flips_flag() {
        let mut buffer = MergeBuffer::default();
        let _ = buffer.merge(vec![record("A", 1, "svc")]);
        let id = buffer.records()[0].id.clone();
        assert_eq!(buffer.toggle_detail(&id), Some(true));
        assert_eq!(buffer.toggle_detail(&id), Some(false));
        assert_eq!(buffer.toggle_detail(&RecordId::from("missing")), None);
    }
}
