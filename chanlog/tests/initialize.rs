// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Process-wide initialization with external control enabled.

use chanlog::ctl::{ControlClient, Resolution, SocketDir};
use chanlog::ctl::discovery::program_name;
use chanlog::sink::ConsoleTarget;
use chanlog::{InitError, LogSettings, Severity, get_log_core};
use pretty_assertions::assert_eq;
use serial_test::serial;

chanlog::declare_channel!("declared");
chanlog::declare_channel!("declared-quiet", Severity::Error);

#[tokio::test]
#[serial]
async fn initialize_serves_and_shuts_down() {
    let tmp = tempfile::tempdir().unwrap();
    let socket_dir = tmp.path().join("sockets");
    let mut settings = LogSettings::default().with_external_control(&socket_dir);
    settings.default_severity = Severity::Debug;
    settings.console = ConsoleTarget::None;
    settings.external_control.open_to_all = true;
    settings.signals.handle_termination = false;

    chanlog::initialize(&settings).unwrap();
    assert!(chanlog::is_initialized());
    assert!(matches!(
        chanlog::initialize(&settings),
        Err(InitError::AlreadyInitialized)
    ));

    let registry = get_log_core().registry();
    assert_eq!(registry.global_default(), Severity::Debug);
    assert_eq!(registry.severity("declared"), Severity::Debug);
    assert_eq!(registry.severity("declared-quiet"), Severity::Error);

    let dir = SocketDir::new(&socket_dir);
    let Resolution::One(candidate) = dir
        .resolve(program_name(), Some(std::process::id()))
        .unwrap()
    else {
        panic!("expected exactly one candidate");
    };
    assert_eq!(candidate.path, dir.own_socket_path());

    let mut client = ControlClient::connect(&candidate.path).await.unwrap();
    let channels = client.get_all_channels().await.unwrap();
    assert!(channels.contains(&"declared".to_string()));
    client
        .set_channel_level("declared", Severity::Fatal.into())
        .await
        .unwrap();
    assert_eq!(registry.severity("declared"), Severity::Fatal);
    drop(client);

    chanlog::shutdown_logging();
    chanlog::shutdown_logging();
    assert!(!candidate.path.exists());
    assert!(dir.discover(program_name(), None).unwrap().is_empty());
}
