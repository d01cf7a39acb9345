// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Logging configuration bundle.
//!
//! Every field has a default, so an empty document is a valid configuration: console output on
//! the standard log stream, `INFO` threshold, no external control, no syslog, no journal.

use crate::ctl::discovery::DEFAULT_SOCKET_DIR;
use crate::severity::Severity;
use crate::sink::{ConsoleTarget, SyslogFacility};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_yaml_ng::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExternalControlSettings {
    /// Serve the control protocol on a discovery socket.
    pub enabled: bool,
    /// Make the socket accessible to every local user.
    pub open_to_all: bool,
    /// Abort initialization if the control socket cannot be set up.
    pub setup_failure_is_fatal: bool,
    pub socket_dir: PathBuf,
}

impl Default for ExternalControlSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            open_to_all: false,
            setup_failure_is_fatal: false,
            socket_dir: PathBuf::from(DEFAULT_SOCKET_DIR),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SyslogSettings {
    pub enabled: bool,
    pub facility: SyslogFacility,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct JournalSettings {
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SignalSettings {
    /// Remove the control socket when SIGINT, SIGTERM or SIGABRT is received.
    pub handle_termination: bool,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            handle_termination: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LogSettings {
    pub default_severity: Severity,
    pub console: ConsoleTarget,
    pub external_control: ExternalControlSettings,
    pub syslog: SyslogSettings,
    pub journal: JournalSettings,
    pub signals: SignalSettings,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_severity: Severity::Info,
            console: ConsoleTarget::default(),
            external_control: ExternalControlSettings::default(),
            syslog: SyslogSettings::default(),
            journal: JournalSettings::default(),
            signals: SignalSettings::default(),
        }
    }
}

impl LogSettings {
    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(path.to_path_buf(), e))?;
        Self::from_yaml(&yaml)
    }

    #[must_use]
    pub fn with_external_control(mut self, socket_dir: impl Into<PathBuf>) -> Self {
        self.external_control.enabled = true;
        self.external_control.socket_dir = socket_dir.into();
        self
    }
}
