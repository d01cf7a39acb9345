// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Severity taxonomy.
//!
//! Every logical tier below `FATAL` comes in two flavours: a *located* variant whose records carry
//! the source location of the call site, and an *unlocated* sibling for high-volume or
//! self-evident messages. Filtering compares severities by [`Severity::rank`], which is an
//! explicit table and deliberately independent of the declaration order or the `repr(u8)` value.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::atomic::{self, AtomicU8};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Severity {
    Info = 0,
    /// Debug without source location
    Debug2 = 1,
    Debug = 2,
    /// Warning without source location
    Warning2 = 3,
    Warning = 4,
    /// Error without source location
    Error2 = 5,
    Error = 6,
    Fatal = 7,
    /// Reserved for the logging subsystem itself. Never filtered.
    Internal = 8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown severity '{0}'")]
pub struct UnknownSeverity(pub String);

impl Severity {
    /// All severities, lowest rank first.
    pub const ALL: [Severity; 9] = [
        Severity::Info,
        Severity::Debug2,
        Severity::Debug,
        Severity::Warning2,
        Severity::Warning,
        Severity::Error2,
        Severity::Error,
        Severity::Fatal,
        Severity::Internal,
    ];

    /// Filtering rank. A record passes a threshold iff `record.rank() >= threshold.rank()`.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Severity::Info => 0,
            Severity::Debug2 => 1,
            Severity::Debug => 2,
            Severity::Warning2 => 3,
            Severity::Warning => 4,
            Severity::Error2 => 5,
            Severity::Error => 6,
            Severity::Fatal => 7,
            Severity::Internal => 8,
        }
    }

    /// Human readable tier. Located and unlocated siblings share the same string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Debug | Severity::Debug2 => "DEBUG",
            Severity::Warning | Severity::Warning2 => "WARNING",
            Severity::Error | Severity::Error2 => "ERROR",
            Severity::Fatal => "FATAL",
            Severity::Internal => "INTERNAL",
        }
    }

    /// Exact variant name, as accepted by configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Debug2 => "DEBUG2",
            Severity::Debug => "DEBUG",
            Severity::Warning2 => "WARNING2",
            Severity::Warning => "WARNING",
            Severity::Error2 => "ERROR2",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
            Severity::Internal => "INTERNAL",
        }
    }

    /// Whether records of this severity carry the source location of their call site.
    #[must_use]
    pub const fn uses_source_location(self) -> bool {
        match self {
            Severity::Info | Severity::Debug2 | Severity::Warning2 | Severity::Error2 => false,
            Severity::Debug
            | Severity::Warning
            | Severity::Error
            | Severity::Fatal
            | Severity::Internal => true,
        }
    }

    /// Syslog priority used by both the syslog and the journal backends.
    #[must_use]
    pub const fn syslog_priority(self) -> libc::c_int {
        match self {
            Severity::Info => libc::LOG_DEBUG,
            Severity::Debug | Severity::Debug2 => libc::LOG_INFO,
            Severity::Warning | Severity::Warning2 => libc::LOG_WARNING,
            Severity::Error | Severity::Error2 => libc::LOG_ERR,
            Severity::Fatal => libc::LOG_CRIT,
            Severity::Internal => libc::LOG_ALERT,
        }
    }

    #[must_use]
    pub const fn from_repr(raw: u8) -> Option<Severity> {
        match raw {
            0 => Some(Severity::Info),
            1 => Some(Severity::Debug2),
            2 => Some(Severity::Debug),
            3 => Some(Severity::Warning2),
            4 => Some(Severity::Warning),
            5 => Some(Severity::Error2),
            6 => Some(Severity::Error),
            7 => Some(Severity::Fatal),
            8 => Some(Severity::Internal),
            _ => None,
        }
    }
}

/// String for a raw severity value. Never fails: invalid values render as `"???"`.
#[must_use]
pub fn severity_str(raw: u8) -> &'static str {
    Severity::from_repr(raw).map_or("???", Severity::as_str)
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = UnknownSeverity;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "debug" => Ok(Severity::Debug),
            "debug2" => Ok(Severity::Debug2),
            "warning" | "warn" => Ok(Severity::Warning),
            "warning2" | "warn2" => Ok(Severity::Warning2),
            "error" | "err" => Ok(Severity::Error),
            "error2" | "err2" => Ok(Severity::Error2),
            "fatal" => Ok(Severity::Fatal),
            "internal" => Ok(Severity::Internal),
            _ => Err(UnknownSeverity(s.to_owned())),
        }
    }
}

/// A [`Severity`] that can be read and written lock-free.
#[derive(Debug)]
pub struct AtomicSeverity(AtomicU8);

impl AtomicSeverity {
    #[must_use]
    pub const fn new(severity: Severity) -> Self {
        Self(AtomicU8::new(severity as u8))
    }
    pub fn load(&self) -> Severity {
        // only ever stores valid discriminants
        Severity::from_repr(self.0.load(atomic::Ordering::Acquire)).unwrap_or(Severity::Info)
    }
    pub fn store(&self, severity: Severity) {
        self.0.store(severity as u8, atomic::Ordering::Release);
    }
}
