// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Runtime control of a process' logging over its discovery socket.

pub mod client;
pub mod discovery;
pub mod server;
pub mod wire;

pub use client::ControlClient;
pub use discovery::{Resolution, SocketCandidate, SocketDir};
pub use server::{ControlServer, ControlService};
pub use wire::{
    CtlRequest, CtlResponse, CtlStatus, SeverityMessage, StatusCode, WireSeverity, parse_level,
};

#[derive(Debug, thiserror::Error)]
pub enum CtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed message: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("Connection closed by peer")]
    ConnectionClosed,
    #[error("{0}")]
    Status(#[from] CtlStatus),
    #[error("Unexpected response to {0}")]
    UnexpectedResponse(&'static str),
}
