// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use super::Sink;
use crate::record::Record;
use crate::severity::Severity;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What a [`CaptureSink`] keeps of each record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRecord {
    pub severity: Severity,
    pub channel: String,
    pub message: String,
    /// Full canonical rendering of the record.
    pub rendered: String,
    pub has_location: bool,
}

/// In-memory FIFO of records, for tests and in-process inspection.
#[derive(Debug, Default)]
pub struct CaptureSink {
    records: Mutex<VecDeque<CapturedRecord>>,
    consumed: AtomicUsize,
    popped: AtomicUsize,
}

impl CaptureSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest record not popped yet.
    pub fn pop(&self) -> Option<CapturedRecord> {
        let rec = self.records.lock().pop_front()?;
        self.popped.fetch_add(1, Ordering::Relaxed);
        Some(rec)
    }

    /// Pop every pending record.
    pub fn drain(&self) -> Vec<CapturedRecord> {
        let drained: Vec<_> = self.records.lock().drain(..).collect();
        self.popped.fetch_add(drained.len(), Ordering::Relaxed);
        drained
    }

    #[must_use]
    pub fn consumed_count(&self) -> usize {
        self.consumed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn popped_count(&self) -> usize {
        self.popped.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.records.lock().len()
    }
}

impl Sink for CaptureSink {
    fn name(&self) -> &'static str {
        "capture"
    }

    fn consume(&self, record: &Record) {
        let captured = CapturedRecord {
            severity: record.severity,
            channel: record.channel.to_string(),
            message: record.message.clone(),
            rendered: record.to_string(),
            has_location: record.location.is_some(),
        };
        self.records.lock().push_back(captured);
        self.consumed.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn fifo_and_counters() {
        let sink = CaptureSink::new();
        for msg in ["one", "two", "three"] {
            sink.consume(&Record::new(
                Arc::from("c"),
                Severity::Info,
                msg.to_string(),
                None,
            ));
        }
        assert_eq!(sink.consumed_count(), 3);
        assert_eq!(sink.pop().map(|r| r.message), Some("one".to_string()));
        assert_eq!(sink.popped_count(), 1);
        let rest: Vec<_> = sink.drain().into_iter().map(|r| r.message).collect();
        assert_eq!(rest, vec!["two", "three"]);
        assert_eq!(sink.popped_count(), 3);
        assert!(sink.pop().is_none());
        assert_eq!(sink.pending(), 0);
    }
}
