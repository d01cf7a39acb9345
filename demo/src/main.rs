// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Small program emitting records on a few channels, to be driven with `chanlogctl`.

#![deny(clippy::all, clippy::pedantic)]

use chanlog::{
    ErrorCode, FatalError, LogSettings, Severity, exit_on_fatal, fatal, get_logger, initialize,
    shutdown_logging,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

chanlog::declare_channel!("net");
chanlog::declare_channel!("disk", Severity::Warning);

#[derive(Parser, Debug)]
#[command(name = "chanlog-demo", about = "Emit log records until stopped")]
struct Args {
    #[arg(long, value_name = "FILE", help = "YAML logging configuration")]
    config: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Enable external control with sockets in DIR"
    )]
    socket_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 1000, help = "Milliseconds between rounds")]
    interval: u64,

    #[arg(long, help = "Stop after this many rounds")]
    count: Option<u64>,

    #[arg(long, help = "End with a fatal error")]
    fail: bool,
}

fn load_settings(args: &Args) -> Result<LogSettings, FatalError> {
    let settings = match &args.config {
        Some(path) => match LogSettings::from_file(path) {
            Ok(settings) => settings,
            Err(e) => fatal!(global: "Invalid configuration: {e}"),
        },
        None => LogSettings::default(),
    };
    Ok(match &args.socket_dir {
        Some(dir) => settings.with_external_control(dir),
        None => settings,
    })
}

fn round(n: u64) {
    let net = get_logger("net");
    let disk = get_logger("disk");

    chanlog::info!(net, "round {n}: link up");
    chanlog::debug!(net, "round {n}: {} packets queued", n * 3);
    chanlog::debug2!(net, "round {n}: polling");
    chanlog::warning!(disk, "round {n}: {}% full", 50 + n % 50);
    chanlog::warning2!(channel: "disk", "round {n}: slow write");
    if let Err(e) = std::fs::metadata("/nonexistent/chanlog-demo") {
        disk.error2(ErrorCode(e));
    }
    chanlog::info!(channel: chanlog::GLOBAL_CHANNEL, "round {n} done");
}

fn run(args: &Args) -> Result<(), FatalError> {
    let settings = load_settings(args)?;
    if let Err(e) = initialize(&settings) {
        fatal!(global: "Logging setup failed: {e}");
    }

    let mut n = 0;
    while args.count.is_none_or(|count| n < count) {
        round(n);
        n += 1;
        std::thread::sleep(Duration::from_millis(args.interval));
    }

    if args.fail {
        fatal!(channel: "net", "giving up after {n} rounds");
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    exit_on_fatal(run(&args));
    shutdown_logging();
}
