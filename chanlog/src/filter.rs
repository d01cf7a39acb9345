// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Severity filter: an immutable snapshot of per-channel thresholds.
//!
//! The registry rebuilds a whole new [`SeverityFilter`] on every change and installs it
//! atomically, so readers on the emission path never see a half-updated filter.

use crate::severity::Severity;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SeverityFilter {
    thresholds: HashMap<Arc<str>, Severity>,
}

impl SeverityFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_map(thresholds: &HashMap<Arc<str>, Severity>) -> Self {
        Self {
            thresholds: thresholds.clone(),
        }
    }

    /// Threshold configured for `channel`, if the channel is known to this filter.
    #[must_use]
    pub fn threshold(&self, channel: &str) -> Option<Severity> {
        self.thresholds.get(channel).copied()
    }

    /// Decide if a record with `severity` on `channel` passes.
    /// `fallback` is the threshold for channels absent from the snapshot.
    #[must_use]
    pub fn should_emit(&self, channel: &str, severity: Severity, fallback: Severity) -> bool {
        if severity == Severity::Internal {
            return true;
        }
        severity >= self.threshold(channel).unwrap_or(fallback)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}
