// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Syslog sink over libc `openlog(3)`/`syslog(3)`.

use super::{Sink, render_body};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::ffi::CString;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum SyslogFacility {
    Kern = libc::LOG_KERN,
    #[default]
    User = libc::LOG_USER,
    Mail = libc::LOG_MAIL,
    Daemon = libc::LOG_DAEMON,
    Auth = libc::LOG_AUTH,
    Syslog = libc::LOG_SYSLOG,
    Lpr = libc::LOG_LPR,
    News = libc::LOG_NEWS,
    Uucp = libc::LOG_UUCP,
    Cron = libc::LOG_CRON,
    Local0 = libc::LOG_LOCAL0,
    Local1 = libc::LOG_LOCAL1,
    Local2 = libc::LOG_LOCAL2,
    Local3 = libc::LOG_LOCAL3,
    Local4 = libc::LOG_LOCAL4,
    Local5 = libc::LOG_LOCAL5,
    Local6 = libc::LOG_LOCAL6,
    Local7 = libc::LOG_LOCAL7,
}

impl SyslogFacility {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kern => "kern",
            Self::User => "user",
            Self::Mail => "mail",
            Self::Daemon => "daemon",
            Self::Auth => "auth",
            Self::Syslog => "syslog",
            Self::Lpr => "lpr",
            Self::News => "news",
            Self::Uucp => "uucp",
            Self::Cron => "cron",
            Self::Local0 => "local0",
            Self::Local1 => "local1",
            Self::Local2 => "local2",
            Self::Local3 => "local3",
            Self::Local4 => "local4",
            Self::Local5 => "local5",
            Self::Local6 => "local6",
            Self::Local7 => "local7",
        }
    }

    #[must_use]
    pub const fn code(self) -> libc::c_int {
        self as libc::c_int
    }
}

impl Display for SyslogFacility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyslogFacility {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kern" => Ok(Self::Kern),
            "user" => Ok(Self::User),
            "mail" => Ok(Self::Mail),
            "daemon" => Ok(Self::Daemon),
            "auth" => Ok(Self::Auth),
            "syslog" => Ok(Self::Syslog),
            "lpr" => Ok(Self::Lpr),
            "news" => Ok(Self::News),
            "uucp" => Ok(Self::Uucp),
            "cron" => Ok(Self::Cron),
            "local0" => Ok(Self::Local0),
            "local1" => Ok(Self::Local1),
            "local2" => Ok(Self::Local2),
            "local3" => Ok(Self::Local3),
            "local4" => Ok(Self::Local4),
            "local5" => Ok(Self::Local5),
            "local6" => Ok(Self::Local6),
            "local7" => Ok(Self::Local7),
            _ => Err(format!("Unknown syslog facility '{s}'")),
        }
    }
}

/// Sink writing to the system logger. Priorities come from [`crate::Severity::syslog_priority`].
#[derive(Debug)]
pub struct SyslogSink {
    facility: SyslogFacility,
}

impl SyslogSink {
    /// Open the process-wide syslog connection. `ident` is kept for the process lifetime,
    /// so only the first call's ident is used.
    #[must_use]
    pub fn open(facility: SyslogFacility, ident: &str) -> Self {
        static IDENT: OnceLock<CString> = OnceLock::new();
        let ident = IDENT.get_or_init(|| {
            CString::new(ident.replace('\0', "")).unwrap_or_default()
        });
        // SAFETY: ident lives in a static for the whole process lifetime.
        unsafe {
            libc::openlog(ident.as_ptr(), libc::LOG_PID, facility.code());
        }
        Self { facility }
    }

    #[must_use]
    pub fn facility(&self) -> SyslogFacility {
        self.facility
    }
}

impl Sink for SyslogSink {
    fn name(&self) -> &'static str {
        "syslog"
    }

    fn consume(&self, record: &Record) {
        let Ok(message) = CString::new(render_body(record).replace('\0', "")) else {
            return;
        };
        let priority = self.facility.code() | record.severity.syslog_priority();
        // SAFETY: "%s" consumes exactly one valid C string argument.
        unsafe {
            libc::syslog(priority, c"%s".as_ptr(), message.as_ptr());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn facility_names() {
        assert_eq!(SyslogFacility::default(), SyslogFacility::User);
        assert_eq!("LOCAL3".parse::<SyslogFacility>(), Ok(SyslogFacility::Local3));
        assert_eq!("daemon".parse::<SyslogFacility>(), Ok(SyslogFacility::Daemon));
        assert!("nope".parse::<SyslogFacility>().is_err());
        assert_eq!(SyslogFacility::Cron.to_string(), "cron");
        assert_eq!(SyslogFacility::Local7.code(), libc::LOG_LOCAL7);
    }

    #[test]
    fn facility_serde() {
        let facility: SyslogFacility = serde_json::from_str("\"local5\"").unwrap();
        assert_eq!(facility, SyslogFacility::Local5);
    }
}
