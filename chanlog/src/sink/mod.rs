// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Output sinks. Every sink receives the same [`Record`] and renders it in its own format.

mod capture;
mod console;
mod journal;
mod syslog;

pub use capture::{CaptureSink, CapturedRecord};
pub use console::{ConsoleSink, ConsoleTarget};
pub use journal::{JOURNAL_SOCKET, JournalSink, encode_journal_entry};
pub use syslog::{SyslogFacility, SyslogSink};

use crate::record::Record;
use std::fmt::Debug;

/// A destination for log records.
///
/// Sinks are called concurrently from any emitting thread and serialize their own writes.
/// A sink must never call back into the logging core.
pub trait Sink: Send + Sync + Debug {
    /// Short name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Output a single record. Failures are swallowed.
    fn consume(&self, record: &Record);
}

/// Render the parts of a record that a backend with its own timestamp and priority
/// handling (syslog, journal) still needs: channel, location and message.
pub(crate) fn render_body(record: &Record) -> String {
    match record.location_tag() {
        Some(tag) => format!("[{}] - {tag} - {}", record.channel, record.message),
        None => format!("[{}] - {}", record.channel, record.message),
    }
}
