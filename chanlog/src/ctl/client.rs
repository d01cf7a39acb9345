// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Control client

use super::CtlError;
use super::wire::{CtlRequest, CtlResponse, SeverityMessage, decode_frame, encode_frame};
use futures_util::{SinkExt, StreamExt};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::net::UnixStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::trace;

/// Connection to the control server of a target process. Requests are answered in order.
#[derive(Debug)]
pub struct ControlClient {
    framed: Framed<UnixStream, LengthDelimitedCodec>,
}

impl ControlClient {
    pub async fn connect<P: AsRef<Path>>(path: P) -> Result<Self, CtlError> {
        let stream = UnixStream::connect(path.as_ref()).await?;
        Ok(Self {
            framed: Framed::new(stream, LengthDelimitedCodec::new()),
        })
    }

    /// Send one request and wait for its response. Error responses become [`CtlError::Status`].
    pub async fn call(&mut self, request: &CtlRequest) -> Result<CtlResponse, CtlError> {
        trace!("Sending {}", request.op_name());
        self.framed.send(encode_frame(request)?).await?;
        let frame = self
            .framed
            .next()
            .await
            .ok_or(CtlError::ConnectionClosed)??;
        match decode_frame::<CtlResponse>(&frame)? {
            CtlResponse::Error(status) => Err(CtlError::Status(status)),
            response => Ok(response),
        }
    }

    async fn call_for_severity(
        &mut self,
        request: CtlRequest,
    ) -> Result<SeverityMessage, CtlError> {
        match self.call(&request).await? {
            CtlResponse::Severity(severity) => Ok(severity),
            _ => Err(CtlError::UnexpectedResponse(request.op_name())),
        }
    }

    async fn call_for_done(&mut self, request: CtlRequest) -> Result<(), CtlError> {
        match self.call(&request).await? {
            CtlResponse::Done => Ok(()),
            _ => Err(CtlError::UnexpectedResponse(request.op_name())),
        }
    }

    pub async fn get_default_level(&mut self) -> Result<SeverityMessage, CtlError> {
        self.call_for_severity(CtlRequest::GetDefaultLogLevel).await
    }

    pub async fn set_default_level(&mut self, severity: SeverityMessage) -> Result<(), CtlError> {
        self.call_for_done(CtlRequest::SetDefaultLogLevel(severity))
            .await
    }

    pub async fn get_channel_level(&mut self, channel: &str) -> Result<SeverityMessage, CtlError> {
        self.call_for_severity(CtlRequest::GetChannelLogLevel {
            channel: channel.to_owned(),
        })
        .await
    }

    pub async fn set_channel_level(
        &mut self,
        channel: &str,
        severity: SeverityMessage,
    ) -> Result<(), CtlError> {
        self.call_for_done(CtlRequest::SetChannelSeverity {
            channel: channel.to_owned(),
            severity,
        })
        .await
    }

    pub async fn get_all_levels(&mut self) -> Result<BTreeMap<String, SeverityMessage>, CtlError> {
        let request = CtlRequest::GetAllLogLevels;
        match self.call(&request).await? {
            CtlResponse::Levels(levels) => Ok(levels),
            _ => Err(CtlError::UnexpectedResponse(request.op_name())),
        }
    }

    pub async fn get_all_channels(&mut self) -> Result<Vec<String>, CtlError> {
        let request = CtlRequest::GetAllLogHandles;
        match self.call(&request).await? {
            CtlResponse::Handles(handles) => Ok(handles),
            _ => Err(CtlError::UnexpectedResponse(request.op_name())),
        }
    }
}
