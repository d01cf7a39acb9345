// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Fatal errors: log at `FATAL` and stop what the caller was doing.

use crate::record::SourceLocation;

/// A fatal condition that has already been logged. Propagate it with `?` up to the entry point,
/// where [`exit_on_fatal`] terminates the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FatalError {
    pub channel: String,
    pub message: String,
    pub location: SourceLocation,
}

impl FatalError {
    #[must_use]
    pub fn new(channel: &str, message: String, location: SourceLocation) -> Self {
        Self {
            channel: channel.to_owned(),
            message,
            location,
        }
    }
}

/// Log a `FATAL` record and return `Err(FatalError)` from the enclosing function.
///
/// ```ignore
/// fatal!(logger, "cannot open {path}");
/// fatal!(channel: "net", "bind failed: {}", err);
/// fatal!(global: "giving up");
/// ```
#[macro_export]
macro_rules! fatal {
    (global: $($arg:tt)+) => {
        $crate::fatal!($crate::get_logger($crate::GLOBAL_CHANNEL), $($arg)+)
    };
    (channel: $channel:expr, $($arg:tt)+) => {
        $crate::fatal!($crate::get_logger($channel), $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        return ::core::result::Result::Err(
            ($logger)
                .fatal_at(format_args!($($arg)+), $crate::location!())
                .into(),
        )
    };
}

/// Entry point adapter: unwrap `result`, or shut logging down and exit with status 1.
/// The fatal record was emitted when the error was built.
pub fn exit_on_fatal<T>(result: Result<T, FatalError>) -> T {
    match result {
        Ok(value) => value,
        Err(_) => {
            crate::init::shutdown_logging();
            std::process::exit(1);
        }
    }
}
