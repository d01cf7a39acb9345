// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Process-wide logging initialization and shutdown.

use crate::ctl::discovery::{self, SocketDir, program_name};
use crate::ctl::server::ControlServer;
use crate::location;
use crate::logger::{LogCore, get_log_core};
use crate::settings::{ExternalControlSettings, LogSettings, SignalSettings};
use crate::signals;
use crate::sink::{ConsoleSink, JournalSink, Sink, SyslogSink};
use parking_lot::Mutex;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Logging is already initialized")]
    AlreadyInitialized,
    #[error("External control setup failed: {0}")]
    ExternalControl(String),
}

static INITIALIZED: AtomicBool = AtomicBool::new(false);
static CONTROL: Mutex<Option<ControlServer>> = Mutex::new(None);
static ATEXIT_REGISTERED: AtomicBool = AtomicBool::new(false);

#[must_use]
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Configure the process-wide logging core. May only succeed once per process.
pub fn initialize(settings: &LogSettings) -> Result<(), InitError> {
    if INITIALIZED.swap(true, Ordering::AcqRel) {
        return Err(InitError::AlreadyInitialized);
    }
    let core = get_log_core();
    core.registry().set_global_default(settings.default_severity);
    core.registry().register_declared();
    install_sinks(core, settings);

    if settings.external_control.enabled {
        start_external_control(core, &settings.external_control, &settings.signals)?;
    }
    Ok(())
}

fn install_sinks(core: &LogCore, settings: &LogSettings) {
    let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();
    let mut problems = Vec::new();

    if let Some(console) = ConsoleSink::new(settings.console) {
        sinks.push(Arc::new(console));
    }
    if settings.syslog.enabled {
        sinks.push(Arc::new(SyslogSink::open(
            settings.syslog.facility,
            program_name(),
        )));
    }
    if settings.journal.enabled {
        match JournalSink::connect(program_name()) {
            Ok(journal) => sinks.push(Arc::new(journal)),
            Err(e) => problems.push(format!("Journal output disabled: {e}")),
        }
    }
    core.set_sinks(sinks);
    for problem in problems {
        core.internal(problem, Some(location!()));
    }
}

extern "C" fn shutdown_at_exit() {
    shutdown_logging();
}

fn register_atexit() -> Result<(), String> {
    if ATEXIT_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }
    // SAFETY: the hook is a plain extern "C" fn with no arguments.
    if unsafe { libc::atexit(shutdown_at_exit) } != 0 {
        ATEXIT_REGISTERED.store(false, Ordering::Release);
        return Err("Failed to register exit hook".to_string());
    }
    Ok(())
}

fn start_external_control(
    core: &LogCore,
    ctl: &ExternalControlSettings,
    signal_settings: &SignalSettings,
) -> Result<(), InitError> {
    let path = SocketDir::new(&ctl.socket_dir).own_socket_path();

    // each step either continues or breaks out with the reason
    let outcome: Result<(), String> = 'setup: {
        if let Err(e) = discovery::setup(&path) {
            break 'setup Err(e.to_string());
        }
        let server = match ControlServer::start(core.clone(), &path) {
            Ok(server) => server,
            Err(e) => break 'setup Err(format!("Failed to start control server: {e}")),
        };
        *CONTROL.lock() = Some(server);

        if ctl.open_to_all
            && let Err(e) = fs::set_permissions(&path, fs::Permissions::from_mode(0o666))
        {
            break 'setup Err(format!(
                "Failed to change permissions of {}: {e}",
                path.display()
            ));
        }
        if let Err(e) = register_atexit() {
            break 'setup Err(e);
        }
        if signal_settings.handle_termination
            && let Err(e) = signals::install(&path)
        {
            break 'setup Err(format!("Failed to install signal handlers: {e}"));
        }
        Ok(())
    };

    match outcome {
        Ok(()) => {
            core.internal(
                format_args!("External control listening on {}", path.display()),
                Some(location!()),
            );
            Ok(())
        }
        Err(reason) => {
            core.internal(reason.as_str(), Some(location!()));
            stop_control();
            if ctl.setup_failure_is_fatal {
                Err(InitError::ExternalControl(reason))
            } else {
                core.internal("Continuing without external control", Some(location!()));
                Ok(())
            }
        }
    }
}

/// Stop the control server, if any, and remove its socket. Returns true if one was running.
fn stop_control() -> bool {
    let server = CONTROL.lock().take();
    let Some(mut server) = server else {
        return false;
    };
    server.stop();
    if let Err(e) = discovery::teardown(server.path()) {
        get_log_core().internal(
            format_args!("Failed to remove socket {}: {e}", server.path().display()),
            Some(location!()),
        );
    }
    true
}

/// Release logging resources: stop external control and remove the discovery socket.
/// Safe to call any number of times.
pub fn shutdown_logging() {
    if stop_control() {
        get_log_core().internal("External control stopped", Some(location!()));
    }
}
