// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Tool to inspect and change the log levels of running programs

#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod cmdline;
mod cmdtree;
mod commands;
mod completions;
mod shell;

use chanlog::ctl::{ControlClient, Resolution, SocketCandidate, SocketDir};
use clap::Parser;
use cmdline::{Action, Cmdline};
use commands::run_command;
use shell::Shell;
use std::process::ExitCode;
use std::rc::Rc;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Pick the one program instance to talk to, or explain why there is none.
fn select_target(cmdline: &Cmdline) -> Result<SocketCandidate, ExitCode> {
    let dir = SocketDir::new(&cmdline.socket_dir);
    match dir.resolve(&cmdline.name, cmdline.pid) {
        Ok(Resolution::One(candidate)) => Ok(candidate),
        Ok(Resolution::None) => {
            println!("No candidates to connect to");
            Err(ExitCode::FAILURE)
        }
        Ok(Resolution::Many(candidates)) => {
            println!("Multiple candidates for connection:");
            for candidate in candidates {
                println!("PID {}", candidate.pid);
            }
            Err(ExitCode::FAILURE)
        }
        Err(e) => {
            error!("{e}");
            Err(ExitCode::FAILURE)
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let cmdline = Cmdline::parse();

    let action = match cmdline.action() {
        Ok(action) => action,
        Err(e) => {
            println!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let target = match select_target(&cmdline) {
        Ok(target) => target,
        Err(code) => return code,
    };
    debug!("Connecting to {}", target.path.display());

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
    {
        Ok(rt) => Rc::new(rt),
        Err(e) => {
            error!("Failed to build runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match rt.block_on(ControlClient::connect(&target.path)) {
        Ok(client) => client,
        Err(e) => {
            println!("Failed to connect to {}: {e}", target.path.display());
            return ExitCode::FAILURE;
        }
    };

    match action {
        Action::Shell => {
            let mut shell = Shell::new(rt, client, &target.program, target.pid);
            if let Err(e) = shell.run(target.path) {
                error!("Shell failed: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Action::Run(command) => {
            let mut client = client;
            let mut stdout = std::io::stdout();
            match rt.block_on(run_command(&mut client, &command, &mut stdout)) {
                Ok(true) => ExitCode::SUCCESS,
                Ok(false) => ExitCode::FAILURE,
                Err(e) => {
                    error!("Failed to write output: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
