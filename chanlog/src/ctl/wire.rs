// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Control protocol messages.
//!
//! Severities travel as a tier plus a `use_source_location` flag: located and unlocated siblings
//! share a tier and are told apart by the flag.

use super::CtlError;
use crate::severity::{Severity, UnknownSeverity};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireSeverity {
    /// Sentinel for a missing or unrecognized severity. Always rejected by mutating operations.
    Unknown,
    Info,
    Debug,
    Warning,
    Error,
    Fatal,
    Internal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityMessage {
    pub value: WireSeverity,
    pub use_source_location: bool,
}

impl SeverityMessage {
    pub const UNKNOWN: SeverityMessage = SeverityMessage {
        value: WireSeverity::Unknown,
        use_source_location: false,
    };

    /// Reconstruct the in-process severity.
    pub fn decode(self) -> Result<Severity, CtlStatus> {
        let located = self.use_source_location;
        Ok(match self.value {
            WireSeverity::Unknown => {
                return Err(CtlStatus::invalid_argument("Severity is unknown"));
            }
            WireSeverity::Info => Severity::Info,
            WireSeverity::Debug if located => Severity::Debug,
            WireSeverity::Debug => Severity::Debug2,
            WireSeverity::Warning if located => Severity::Warning,
            WireSeverity::Warning => Severity::Warning2,
            WireSeverity::Error if located => Severity::Error,
            WireSeverity::Error => Severity::Error2,
            WireSeverity::Fatal => Severity::Fatal,
            WireSeverity::Internal => Severity::Internal,
        })
    }
}

impl From<Severity> for SeverityMessage {
    fn from(severity: Severity) -> Self {
        let value = match severity {
            Severity::Info => WireSeverity::Info,
            Severity::Debug | Severity::Debug2 => WireSeverity::Debug,
            Severity::Warning | Severity::Warning2 => WireSeverity::Warning,
            Severity::Error | Severity::Error2 => WireSeverity::Error,
            Severity::Fatal => WireSeverity::Fatal,
            Severity::Internal => WireSeverity::Internal,
        };
        Self {
            value,
            use_source_location: severity.uses_source_location(),
        }
    }
}

impl Display for SeverityMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.decode() {
            Ok(severity) => severity.fmt(f),
            Err(_) => f.write_str("???"),
        }
    }
}

/// Parse a human level name into its wire form. `debug` is the located variant and `debug2` the
/// unlocated one, as everywhere else.
pub fn parse_level(level: &str) -> Result<SeverityMessage, UnknownSeverity> {
    level.parse::<Severity>().map(SeverityMessage::from)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    InvalidArgument,
    Internal,
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusCode::InvalidArgument => write!(f, "invalid argument"),
            StatusCode::Internal => write!(f, "internal error"),
        }
    }
}

/// Failure reported by the control service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} ({code})")]
pub struct CtlStatus {
    pub code: StatusCode,
    pub message: String,
}

impl CtlStatus {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::InvalidArgument,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::Internal,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args")]
pub enum CtlRequest {
    GetDefaultLogLevel,
    SetDefaultLogLevel(SeverityMessage),
    GetChannelLogLevel {
        channel: String,
    },
    SetChannelSeverity {
        channel: String,
        severity: SeverityMessage,
    },
    GetAllLogLevels,
    GetAllLogHandles,
}

impl CtlRequest {
    #[must_use]
    pub fn op_name(&self) -> &'static str {
        match self {
            CtlRequest::GetDefaultLogLevel => "GetDefaultLogLevel",
            CtlRequest::SetDefaultLogLevel(_) => "SetDefaultLogLevel",
            CtlRequest::GetChannelLogLevel { .. } => "GetChannelLogLevel",
            CtlRequest::SetChannelSeverity { .. } => "SetChannelSeverity",
            CtlRequest::GetAllLogLevels => "GetAllLogLevels",
            CtlRequest::GetAllLogHandles => "GetAllLogHandles",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CtlResponse {
    Severity(SeverityMessage),
    Done,
    Levels(BTreeMap<String, SeverityMessage>),
    Handles(Vec<String>),
    Error(CtlStatus),
}

pub(crate) fn encode_frame<T: Serialize>(msg: &T) -> Result<Bytes, CtlError> {
    Ok(Bytes::from(serde_json::to_vec(msg)?))
}

pub(crate) fn decode_frame<T: DeserializeOwned>(frame: &[u8]) -> Result<T, CtlError> {
    Ok(serde_json::from_slice(frame)?)
}
