// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Log records and their canonical text rendering

use crate::severity::Severity;
use chrono::{DateTime, Local};
use std::fmt::Display;
use std::panic::Location;
use std::sync::Arc;

/// Where a record was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
    /// Enclosing module. Empty when captured through `#[track_caller]`.
    pub module: &'static str,
}

impl SourceLocation {
    #[must_use]
    pub const fn new(file: &'static str, line: u32, module: &'static str) -> Self {
        Self { file, line, module }
    }

    /// Location of the caller of the (`#[track_caller]`) function invoking this.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let loc = Location::caller();
        Self {
            file: loc.file(),
            line: loc.line(),
            module: "",
        }
    }

    /// Base name of the source file.
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        self.file.rsplit(['/', '\\']).next().unwrap_or(self.file)
    }
}

/// Capture the current source location, including the module path.
#[macro_export]
macro_rules! location {
    () => {
        $crate::record::SourceLocation::new(file!(), line!(), module_path!())
    };
}

/// A single log emission, handed to every active sink.
#[derive(Debug, Clone)]
pub struct Record {
    pub timestamp: DateTime<Local>,
    pub channel: Arc<str>,
    pub severity: Severity,
    pub message: String,
    pub location: Option<SourceLocation>,
}

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%b-%d %H:%M:%S%.6f";

impl Record {
    /// Build a record stamped with the current time. The location is dropped for
    /// severities that don't carry one.
    #[must_use]
    pub fn new(
        channel: Arc<str>,
        severity: Severity,
        message: String,
        location: Option<SourceLocation>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            channel,
            severity,
            message,
            location: location.filter(|_| severity.uses_source_location()),
        }
    }

    /// The location segment of the canonical rendering, without trailing separator.
    #[must_use]
    pub fn location_tag(&self) -> Option<String> {
        if !self.severity.uses_source_location() {
            return None;
        }
        Some(match &self.location {
            Some(loc) if loc.module.is_empty() => {
                format!("[{}:{}]", loc.file_name(), loc.line)
            }
            Some(loc) => format!("[{}, {}:{}]", loc.module, loc.file_name(), loc.line),
            None => "[Error: Could not retrieve source line]".to_string(),
        })
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} <{}> [{}] - ",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.severity,
            self.channel
        )?;
        if let Some(tag) = self.location_tag() {
            write!(f, "{tag} - ")?;
        }
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(severity: Severity, location: Option<SourceLocation>) -> Record {
        Record::new(Arc::from("net"), severity, "hello".to_string(), location)
    }

    #[test]
    fn located_rendering() {
        let loc = SourceLocation::new("src/deep/path/conn.rs", 42, "app::conn");
        let rendered = record(Severity::Warning, Some(loc)).to_string();
        assert!(
            rendered.ends_with("<WARNING> [net] - [app::conn, conn.rs:42] - hello"),
            "{rendered}"
        );
    }

    #[test]
    fn unlocated_severity_drops_location() {
        let loc = SourceLocation::new("src/conn.rs", 1, "app");
        let rec = record(Severity::Warning2, Some(loc));
        assert!(rec.location.is_none());
        assert!(rec.to_string().ends_with("<WARNING> [net] - hello"));
        assert!(record(Severity::Info, Some(loc)).location.is_none());
    }

    #[test]
    fn missing_location_is_reported() {
        let rendered = record(Severity::Error, None).to_string();
        assert!(rendered.ends_with(
            "<ERROR> [net] - [Error: Could not retrieve source line] - hello"
        ));
    }

    #[test]
    fn caller_location() {
        let loc = SourceLocation::caller();
        assert_eq!(loc.file_name(), "record.rs");
        let rec = record(Severity::Debug, Some(loc));
        assert_eq!(rec.location_tag(), Some(format!("[record.rs:{}]", loc.line)));
    }

    #[test]
    fn location_macro() {
        let loc = crate::location!();
        assert_eq!(loc.module, "chanlog::record::test");
        assert_eq!(loc.file_name(), "record.rs");
    }
}
