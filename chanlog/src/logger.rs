// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Emission API: the logging core, bound-channel loggers and the emission macros.

use crate::fatal::FatalError;
use crate::record::{Record, SourceLocation};
use crate::registry::ChannelRegistry;
use crate::severity::Severity;
use crate::sink::{ConsoleSink, ConsoleTarget, Sink};
use arc_swap::ArcSwap;
use std::fmt::{self, Display};
use std::sync::{Arc, OnceLock};

/// Channel targeted by global fatal errors.
pub const GLOBAL_CHANNEL: &str = "Global";

/// Reserved channel of the logging subsystem's own diagnostics. Never registered.
pub const INTERNAL_CHANNEL: &str = "chanlog_internal";

/// Something that can become the text of a record. Rendering only happens for records
/// that pass the filter.
pub trait Payload {
    fn render(self) -> String;
}

impl Payload for &str {
    fn render(self) -> String {
        self.to_owned()
    }
}

impl Payload for String {
    fn render(self) -> String {
        self
    }
}

impl Payload for &String {
    fn render(self) -> String {
        self.clone()
    }
}

impl Payload for fmt::Arguments<'_> {
    fn render(self) -> String {
        match self.as_str() {
            Some(s) => s.to_owned(),
            None => self.to_string(),
        }
    }
}

/// An error code, rendered through its `Display`.
#[derive(Debug, Clone, Copy)]
pub struct ErrorCode<E>(pub E);

impl<E: Display> Display for ErrorCode<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<E: Display> Payload for ErrorCode<E> {
    fn render(self) -> String {
        self.to_string()
    }
}

/// The calling thread's `errno`, captured when the value is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastErrno(pub nix::errno::Errno);

impl LastErrno {
    #[must_use]
    pub fn capture() -> Self {
        Self(nix::errno::Errno::last())
    }
}

impl Display for LastErrno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.desc())
    }
}

impl Payload for LastErrno {
    fn render(self) -> String {
        self.to_string()
    }
}

#[derive(Debug)]
struct CoreInner {
    registry: ChannelRegistry,
    sinks: ArcSwap<Vec<Arc<dyn Sink>>>,
    internal: Arc<str>,
}

/// The logging context: a channel registry plus the active sinks.
///
/// Cheap to clone. Most programs use the process-wide instance from [`get_log_core`]; tests build
/// their own.
#[derive(Debug, Clone)]
pub struct LogCore(Arc<CoreInner>);

impl LogCore {
    /// A core with no sinks.
    #[must_use]
    pub fn new(default: Severity) -> Self {
        Self(Arc::new(CoreInner {
            registry: ChannelRegistry::new(default),
            sinks: ArcSwap::from_pointee(Vec::new()),
            internal: Arc::from(INTERNAL_CHANNEL),
        }))
    }

    #[must_use]
    pub fn registry(&self) -> &ChannelRegistry {
        &self.0.registry
    }

    /// Logger for channel `name`, creating the channel if needed.
    #[must_use]
    pub fn logger(&self, name: &str) -> Logger {
        Logger {
            channel: self.0.registry.get_or_create(name),
            core: self.clone(),
        }
    }

    pub fn add_sink(&self, sink: Arc<dyn Sink>) {
        self.0.sinks.rcu(|current| {
            let mut sinks = Vec::clone(current);
            sinks.push(sink.clone());
            sinks
        });
    }

    pub fn set_sinks(&self, sinks: Vec<Arc<dyn Sink>>) {
        self.0.sinks.store(Arc::new(sinks));
    }

    pub fn clear_sinks(&self) {
        self.set_sinks(Vec::new());
    }

    #[must_use]
    pub fn sinks(&self) -> Arc<Vec<Arc<dyn Sink>>> {
        self.0.sinks.load_full()
    }

    /// Hand a record to every sink. Filtering has already happened.
    pub fn dispatch(&self, record: &Record) {
        let sinks = self.0.sinks.load();
        for sink in sinks.iter() {
            sink.consume(record);
        }
    }

    /// Emit a diagnostic of the logging subsystem itself. Never filtered.
    pub fn internal(&self, message: impl Payload, location: Option<SourceLocation>) {
        let record = Record::new(
            self.0.internal.clone(),
            Severity::Internal,
            message.render(),
            location,
        );
        self.dispatch(&record);
    }
}

static LOG_CORE: OnceLock<LogCore> = OnceLock::new();

/// The process-wide logging core. Until [`crate::initialize`] runs it writes to the standard
/// log stream with an `INFO` default.
pub fn get_log_core() -> &'static LogCore {
    LOG_CORE.get_or_init(|| {
        let core = LogCore::new(Severity::Info);
        if let Some(console) = ConsoleSink::new(ConsoleTarget::Stdlog) {
            core.add_sink(Arc::new(console));
        }
        core
    })
}

/// Logger for channel `name` on the process-wide core.
#[must_use]
pub fn get_logger(name: &str) -> Logger {
    get_log_core().logger(name)
}

/// Handle bound to one channel.
#[derive(Debug, Clone)]
pub struct Logger {
    channel: Arc<str>,
    core: LogCore,
}

impl Logger {
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    #[must_use]
    pub fn core(&self) -> &LogCore {
        &self.core
    }

    #[must_use]
    pub fn is_enabled(&self, severity: Severity) -> bool {
        self.core.registry().should_emit(&self.channel, severity)
    }

    /// Current threshold of this channel.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.core.registry().severity(&self.channel)
    }

    pub fn set_severity(&self, severity: Severity) {
        self.core.registry().set_severity(&self.channel, severity);
    }

    pub fn log(&self, severity: Severity, payload: impl Payload, location: Option<SourceLocation>) {
        if !self.is_enabled(severity) {
            return;
        }
        let record = Record::new(self.channel.clone(), severity, payload.render(), location);
        self.core.dispatch(&record);
    }

    #[track_caller]
    pub fn info(&self, payload: impl Payload) {
        self.log(Severity::Info, payload, None);
    }

    #[track_caller]
    pub fn debug(&self, payload: impl Payload) {
        self.log(Severity::Debug, payload, Some(SourceLocation::caller()));
    }

    #[track_caller]
    pub fn debug2(&self, payload: impl Payload) {
        self.log(Severity::Debug2, payload, None);
    }

    #[track_caller]
    pub fn warning(&self, payload: impl Payload) {
        self.log(Severity::Warning, payload, Some(SourceLocation::caller()));
    }

    #[track_caller]
    pub fn warning2(&self, payload: impl Payload) {
        self.log(Severity::Warning2, payload, None);
    }

    #[track_caller]
    pub fn error(&self, payload: impl Payload) {
        self.log(Severity::Error, payload, Some(SourceLocation::caller()));
    }

    #[track_caller]
    pub fn error2(&self, payload: impl Payload) {
        self.log(Severity::Error2, payload, None);
    }

    /// Emit a FATAL record at the caller's location and return the matching error,
    /// for the caller to propagate.
    #[track_caller]
    #[must_use]
    pub fn fatal(&self, payload: impl Payload) -> FatalError {
        self.fatal_at(payload, SourceLocation::caller())
    }

    #[must_use]
    pub fn fatal_at(&self, payload: impl Payload, location: SourceLocation) -> FatalError {
        let message = payload.render();
        self.log(Severity::Fatal, message.as_str(), Some(location));
        FatalError::new(self.channel(), message, location)
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($severity:expr, channel: $channel:expr, $($arg:tt)+) => {{
        let logger = $crate::get_logger($channel);
        $crate::__emit!($severity, logger, $($arg)+)
    }};
    ($severity:expr, $logger:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let severity: $crate::Severity = $severity;
        if logger.is_enabled(severity) {
            logger.log(severity, format_args!($($arg)+), Some($crate::location!()));
        }
    }};
}

/// Emit an `INFO` record: `info!(logger, "fmt", ..)` or `info!(channel: "name", "fmt", ..)`.
#[macro_export]
macro_rules! info {
    (channel: $channel:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Info, channel: $channel, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Info, $logger, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    (channel: $channel:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Debug, channel: $channel, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Debug, $logger, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug2 {
    (channel: $channel:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Debug2, channel: $channel, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Debug2, $logger, $($arg)+)
    };
}

#[macro_export]
macro_rules! warning {
    (channel: $channel:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Warning, channel: $channel, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Warning, $logger, $($arg)+)
    };
}

#[macro_export]
macro_rules! warning2 {
    (channel: $channel:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Warning2, channel: $channel, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Warning2, $logger, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    (channel: $channel:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Error, channel: $channel, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Error, $logger, $($arg)+)
    };
}

#[macro_export]
macro_rules! error2 {
    (channel: $channel:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Error2, channel: $channel, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit!($crate::Severity::Error2, $logger, $($arg)+)
    };
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sink::CaptureSink;
    use pretty_assertions::assert_eq;

    fn core_with_capture(default: Severity) -> (LogCore, Arc<CaptureSink>) {
        let core = LogCore::new(default);
        let capture = Arc::new(CaptureSink::new());
        core.add_sink(capture.clone());
        (core, capture)
    }

    #[test]
    fn filter_gates_dispatch() {
        let (core, capture) = core_with_capture(Severity::Warning);
        let net = core.logger("net");
        net.info("dropped");
        net.warning2("dropped too");
        net.warning("kept");
        net.error("kept too");
        assert!(!net.is_enabled(Severity::Warning2));
        let seen: Vec<_> = capture.drain().into_iter().map(|r| r.message).collect();
        assert_eq!(seen, vec!["kept", "kept too"]);
    }

    #[test]
    fn every_severity_at_or_above_threshold_is_observed() {
        for threshold in Severity::ALL {
            let (core, capture) = core_with_capture(threshold);
            let logger = core.logger("c");
            for sev in Severity::ALL {
                logger.log(sev, "m", None);
            }
            let observed: Vec<Severity> =
                capture.drain().into_iter().map(|r| r.severity).collect();
            let expected: Vec<Severity> = Severity::ALL
                .into_iter()
                .filter(|s| *s == Severity::Internal || *s >= threshold)
                .collect();
            assert_eq!(observed, expected, "threshold {threshold:?}");
        }
    }

    #[test]
    fn track_caller_locations() {
        let (core, capture) = core_with_capture(Severity::Info);
        let logger = core.logger("loc");
        logger.debug("located");
        logger.debug2("unlocated");
        let located = capture.pop().unwrap();
        assert!(located.has_location);
        assert!(located.rendered.contains("[logger.rs:"), "{}", located.rendered);
        let unlocated = capture.pop().unwrap();
        assert!(!unlocated.has_location);
        assert!(unlocated.rendered.ends_with("<DEBUG> [loc] - unlocated"));
    }

    #[test]
    fn macros_with_bound_logger() {
        let (core, capture) = core_with_capture(Severity::Info);
        let logger = core.logger("m");
        let port = 7;
        info!(logger, "port {port} up");
        warning!(&logger, "port {} flapping", port);
        error2!(logger, "plain");
        let records = capture.drain();
        assert_eq!(records[0].message, "port 7 up");
        assert_eq!(records[1].severity, Severity::Warning);
        assert!(records[1].rendered.contains("[chanlog::logger::test, logger.rs:"));
        assert_eq!(records[2].severity, Severity::Error2);
        assert!(!records[2].has_location);
    }

    #[test]
    fn macros_skip_formatting_when_filtered() {
        struct Panicky;
        impl Display for Panicky {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                panic!("formatted a filtered record");
            }
        }
        let (core, capture) = core_with_capture(Severity::Error);
        let logger = core.logger("quiet");
        debug!(logger, "{}", Panicky);
        debug2!(logger, "{}", Panicky);
        assert_eq!(capture.consumed_count(), 0);
    }

    #[test]
    fn internal_bypasses_filter_and_registry() {
        let (core, capture) = core_with_capture(Severity::Internal);
        core.internal("self check", None);
        let rec = capture.pop().unwrap();
        assert_eq!(rec.channel, INTERNAL_CHANNEL);
        assert_eq!(rec.severity, Severity::Internal);
        assert!(!core.registry().contains(INTERNAL_CHANNEL));
    }

    #[test]
    fn payload_flavours() {
        let (core, capture) = core_with_capture(Severity::Info);
        let logger = core.logger("p");
        logger.info(String::from("owned"));
        logger.info(format_args!("{}-{}", 1, 2));
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such thing");
        logger.info(ErrorCode(&err));
        logger.info(LastErrno(nix::errno::Errno::ENOENT));
        let seen: Vec<_> = capture.drain().into_iter().map(|r| r.message).collect();
        assert_eq!(
            seen,
            vec![
                "owned".to_string(),
                "1-2".to_string(),
                "no such thing".to_string(),
                nix::errno::Errno::ENOENT.desc().to_string()
            ]
        );
    }

    #[test]
    fn fatal_emits_and_returns_error() {
        let (core, capture) = core_with_capture(Severity::Info);
        let logger = core.logger("f");
        let err = logger.fatal("cannot continue");
        assert_eq!(err.channel, "f");
        assert_eq!(err.message, "cannot continue");
        assert_eq!(err.location.file_name(), "logger.rs");
        let rec = capture.pop().unwrap();
        assert_eq!(rec.severity, Severity::Fatal);
        assert!(rec.has_location);
    }

    #[test]
    fn loggers_share_the_channel() {
        let (core, _capture) = core_with_capture(Severity::Info);
        let a = core.logger("same");
        let b = core.logger("same");
        a.set_severity(Severity::Error);
        assert_eq!(b.severity(), Severity::Error);
        assert!(!b.is_enabled(Severity::Warning));
        assert_eq!(core.registry().all_channels(), vec!["same".to_string()]);
    }

    #[test]
    fn sink_set_management() {
        let core = LogCore::new(Severity::Info);
        assert!(core.sinks().is_empty());
        core.add_sink(Arc::new(CaptureSink::new()));
        core.add_sink(Arc::new(CaptureSink::new()));
        assert_eq!(core.sinks().len(), 2);
        core.clear_sinks();
        assert!(core.sinks().is_empty());
    }
}
