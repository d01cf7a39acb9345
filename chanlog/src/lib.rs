// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Channel-based logging with runtime control.
//!
//! Applications emit severity-tagged records on named channels. Each channel has its own
//! threshold, which an external tool can read and change at runtime through a control socket
//! that is discoverable by program name and pid.
//!
//! ```ignore
//! chanlog::declare_channel!("net");
//!
//! fn main() {
//!     let settings = chanlog::LogSettings::default().with_external_control("/tmp/chanlog");
//!     chanlog::initialize(&settings).unwrap();
//!     let net = chanlog::get_logger("net");
//!     chanlog::warning!(net, "link {} down", 3);
//!     chanlog::info!(channel: "disk", "mounted");
//!     chanlog::shutdown_logging();
//! }
//! ```

#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod ctl;
pub mod fatal;
pub mod filter;
pub mod init;
pub mod logger;
pub mod record;
pub mod registry;
pub mod settings;
pub mod severity;
mod signals;
pub mod sink;

// re-exports
pub use fatal::{FatalError, exit_on_fatal};
pub use init::{InitError, initialize, is_initialized, shutdown_logging};
pub use logger::{
    ErrorCode, GLOBAL_CHANNEL, INTERNAL_CHANNEL, LastErrno, LogCore, Logger, Payload,
    get_log_core, get_logger,
};
pub use record::{Record, SourceLocation};
pub use registry::ChannelRegistry;
pub use settings::{LogSettings, SettingsError};
pub use severity::{Severity, severity_str};
pub use signals::shutdown_requested;

#[doc(hidden)]
pub use linkme;
