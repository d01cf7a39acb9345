// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Termination signal handling.
//!
//! The handler only does async-signal-safe work: it raises a flag, unlinks the control socket
//! through a path prepared in advance and re-raises the signal, which the one-shot
//! (`SA_RESETHAND`) registration has already reset to its default disposition.

use nix::errno::Errno;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

const TERMINATION_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGABRT];

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);
static SOCKET_PATH: OnceLock<CString> = OnceLock::new();

extern "C" fn on_termination(signal: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
    if let Some(path) = SOCKET_PATH.get() {
        // SAFETY: unlink is async-signal-safe and path is a valid C string living in a static.
        unsafe {
            libc::unlink(path.as_ptr());
        }
    }
    // SAFETY: raise is async-signal-safe.
    unsafe {
        libc::raise(signal);
    }
}

/// Install the termination handlers, removing the socket at `socket` when they fire.
/// Only the first socket path is kept for the process lifetime.
pub(crate) fn install(socket: &Path) -> Result<(), Errno> {
    let path = CString::new(socket.as_os_str().as_bytes()).map_err(|_| Errno::EINVAL)?;
    let _ = SOCKET_PATH.set(path);
    let action = SigAction::new(
        SigHandler::Handler(on_termination),
        SaFlags::SA_RESETHAND,
        SigSet::empty(),
    );
    for signal in TERMINATION_SIGNALS {
        // SAFETY: the handler only performs async-signal-safe operations.
        unsafe { sigaction(signal, &action) }?;
    }
    Ok(())
}

/// True once a termination signal has been received. Only other threads can observe it, while
/// the re-raised signal takes the process down.
#[must_use]
pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}
