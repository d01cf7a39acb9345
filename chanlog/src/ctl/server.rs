// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Control server: serves the control protocol of a [`LogCore`] on a Unix socket.

use super::CtlError;
use super::wire::{
    CtlRequest, CtlResponse, CtlStatus, SeverityMessage, decode_frame, encode_frame,
};
use crate::location;
use crate::logger::LogCore;
use futures_util::{SinkExt, StreamExt};
use std::os::unix::net::UnixListener as StdUnixListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info, warn};

/// Transport-free request handler, mirroring the channel registry one operation at a time.
#[derive(Debug, Clone)]
pub struct ControlService {
    core: LogCore,
}

impl ControlService {
    #[must_use]
    pub fn new(core: LogCore) -> Self {
        Self { core }
    }

    #[must_use]
    pub fn handle(&self, request: CtlRequest) -> CtlResponse {
        let registry = self.core.registry();
        match request {
            CtlRequest::GetDefaultLogLevel => {
                CtlResponse::Severity(registry.global_default().into())
            }
            CtlRequest::SetDefaultLogLevel(severity) => match severity.decode() {
                Ok(severity) => {
                    registry.set_global_default(severity);
                    debug!("Global default severity set to {severity}");
                    CtlResponse::Done
                }
                Err(status) => CtlResponse::Error(status),
            },
            CtlRequest::GetChannelLogLevel { channel } => {
                CtlResponse::Severity(registry.severity(&channel).into())
            }
            CtlRequest::SetChannelSeverity { channel, severity } => {
                let severity = match severity.decode() {
                    Ok(severity) => severity,
                    Err(status) => return CtlResponse::Error(status),
                };
                if registry.set_severity(&channel, severity) {
                    debug!("Channel {channel} severity set to {severity}");
                    CtlResponse::Done
                } else {
                    CtlResponse::Error(CtlStatus::invalid_argument(format!(
                        "Channel '{channel}' does not exist"
                    )))
                }
            }
            CtlRequest::GetAllLogLevels => CtlResponse::Levels(
                registry
                    .all_severities()
                    .into_iter()
                    .map(|(name, sev)| (name, SeverityMessage::from(sev)))
                    .collect(),
            ),
            CtlRequest::GetAllLogHandles => CtlResponse::Handles(registry.all_channels()),
        }
    }
}

async fn serve_connection(
    stream: UnixStream,
    service: Arc<ControlService>,
) -> Result<(), CtlError> {
    let mut framed = Framed::new(stream, LengthDelimitedCodec::new());
    while let Some(frame) = framed.next().await {
        let frame = frame?;
        let response = match decode_frame::<CtlRequest>(&frame) {
            Ok(request) => service.handle(request),
            Err(e) => {
                warn!("Rejecting malformed control request: {e}");
                CtlResponse::Error(CtlStatus::invalid_argument(e.to_string()))
            }
        };
        framed.send(encode_frame(&response)?).await?;
    }
    Ok(())
}

async fn serve(
    listener: UnixListener,
    service: Arc<ControlService>,
    mut stop: oneshot::Receiver<()>,
) {
    let mut tasks: JoinSet<Result<(), CtlError>> = JoinSet::new();
    loop {
        tokio::select! {
            _ = &mut stop => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _)) => {
                        let service = Arc::clone(&service);
                        tasks.spawn(async move { serve_connection(stream, service).await });
                    }
                    Err(e) => warn!("Failed to accept control connection: {e}"),
                }
            }
        }
        // reap finished connections
        while let Some(joined) = tasks.try_join_next() {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!("Control connection ended with error: {e}"),
                Err(e) => warn!("Control connection task failed: {e}"),
            }
        }
    }
    tasks.shutdown().await;
}

/// A running control server. The socket is bound and the runtime built when
/// [`ControlServer::start`] returns; requests are served on a dedicated thread until
/// [`ControlServer::stop`].
#[derive(Debug)]
pub struct ControlServer {
    core: LogCore,
    path: PathBuf,
    stop: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ControlServer {
    pub fn start(core: LogCore, path: impl Into<PathBuf>) -> Result<Self, CtlError> {
        let path = path.into();
        let listener = StdUnixListener::bind(&path)?;
        listener.set_nonblocking(true)?;
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()?;
        let listener = {
            let _guard = rt.enter();
            UnixListener::from_std(listener)?
        };
        let service = Arc::new(ControlService::new(core.clone()));
        let (stop_tx, stop_rx) = oneshot::channel();

        let thread = std::thread::Builder::new()
            .name("chanlog-ctl".to_string())
            .spawn(move || {
                rt.block_on(serve(listener, service, stop_rx));
                debug!("Control server stopped");
            })?;

        info!("Control server listening at {}", path.display());
        Ok(Self {
            core,
            path,
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop serving and wait for the server thread. Idempotent. Leaves the socket file alone.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            self.core
                .internal("Control server thread panicked", Some(location!()));
        }
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ctl::client::ControlClient;
    use crate::ctl::wire::{StatusCode, WireSeverity};
    use crate::severity::Severity;
    use pretty_assertions::assert_eq;

    #[test]
    fn service_operations() {
        let core = LogCore::new(Severity::Warning);
        let service = ControlService::new(core.clone());

        assert_eq!(
            service.handle(CtlRequest::GetDefaultLogLevel),
            CtlResponse::Severity(Severity::Warning.into())
        );
        // unknown channel falls back to default
        assert_eq!(
            service.handle(CtlRequest::GetChannelLogLevel {
                channel: "ghost".to_string()
            }),
            CtlResponse::Severity(Severity::Warning.into())
        );

        let missing = service.handle(CtlRequest::SetChannelSeverity {
            channel: "ghost".to_string(),
            severity: Severity::Info.into(),
        });
        let CtlResponse::Error(status) = missing else {
            panic!("expected an error, got {missing:?}");
        };
        assert_eq!(status.code, StatusCode::InvalidArgument);
        assert!(!core.registry().contains("ghost"));

        let _net = core.logger("net");
        assert_eq!(
            service.handle(CtlRequest::SetChannelSeverity {
                channel: "net".to_string(),
                severity: Severity::Debug2.into(),
            }),
            CtlResponse::Done
        );
        assert_eq!(core.registry().severity("net"), Severity::Debug2);

        assert_eq!(
            service.handle(CtlRequest::GetAllLogHandles),
            CtlResponse::Handles(vec!["net".to_string()])
        );
        let CtlResponse::Levels(levels) = service.handle(CtlRequest::GetAllLogLevels) else {
            panic!("expected levels");
        };
        assert_eq!(levels.get("net"), Some(&Severity::Debug2.into()));
    }

    #[test]
    fn unknown_severity_is_rejected_without_effect() {
        let core = LogCore::new(Severity::Info);
        let _net = core.logger("net");
        let service = ControlService::new(core.clone());

        let resp = service.handle(CtlRequest::SetDefaultLogLevel(SeverityMessage::UNKNOWN));
        assert!(matches!(resp, CtlResponse::Error(ref s) if s.code == StatusCode::InvalidArgument));
        let resp = service.handle(CtlRequest::SetChannelSeverity {
            channel: "net".to_string(),
            severity: SeverityMessage {
                value: WireSeverity::Unknown,
                use_source_location: true,
            },
        });
        assert!(matches!(resp, CtlResponse::Error(_)));
        assert_eq!(core.registry().global_default(), Severity::Info);
        assert_eq!(core.registry().severity("net"), Severity::Info);
    }

    #[tokio::test]
    async fn serves_over_unix_socket() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("1-test.socket");
        let core = LogCore::new(Severity::Error);
        let _chan = core.logger("disk");
        let mut server = ControlServer::start(core.clone(), &path).unwrap();
        assert_eq!(server.path(), path.as_path());

        let mut client = ControlClient::connect(&path).await.unwrap();
        assert_eq!(
            client.get_default_level().await.unwrap().decode(),
            Ok(Severity::Error)
        );
        client
            .set_channel_level("disk", Severity::Warning2.into())
            .await
            .unwrap();
        assert_eq!(core.registry().severity("disk"), Severity::Warning2);

        let err = client
            .set_channel_level("nope", Severity::Info.into())
            .await
            .unwrap_err();
        assert!(matches!(err, CtlError::Status(ref s) if s.code == StatusCode::InvalidArgument));

        // the connection survives an error response
        client.set_default_level(Severity::Debug.into()).await.unwrap();
        assert_eq!(core.registry().severity("disk"), Severity::Debug);
        assert_eq!(client.get_all_channels().await.unwrap(), vec!["disk".to_string()]);

        server.stop();
        server.stop();
        assert!(ControlClient::connect(&path).await.is_err());
    }

    #[test]
    fn bind_failure_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing-dir/1-x.socket");
        let err = ControlServer::start(LogCore::new(Severity::Info), &path).unwrap_err();
        assert!(matches!(err, CtlError::Io(_)));
    }
}
