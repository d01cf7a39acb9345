// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A failing control socket setup leaves logging running without external control.

use chanlog::sink::{CaptureSink, ConsoleTarget};
use chanlog::{LogSettings, Severity, get_log_core, get_logger};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[test]
fn socket_dir_blocked_by_file_degrades() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();

    let mut settings = LogSettings::default().with_external_control(&blocker);
    settings.console = ConsoleTarget::None;
    settings.signals.handle_termination = false;

    assert!(chanlog::initialize(&settings).is_ok());
    assert!(chanlog::is_initialized());
    assert!(blocker.is_file());

    let capture = Arc::new(CaptureSink::new());
    get_log_core().add_sink(capture.clone());
    chanlog::warning!(get_logger("net"), "still logging");
    let seen = capture.pop().unwrap();
    assert_eq!(seen.severity, Severity::Warning);
    assert_eq!(seen.message, "still logging");

    // nothing to stop
    chanlog::shutdown_logging();
    assert_eq!(capture.pending(), 0);
}
