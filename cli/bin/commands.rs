// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Management commands: parsing shell input, calling the target and rendering answers

use chanlog::ctl::{ControlClient, CtlError, CtlRequest, CtlResponse, SeverityMessage, parse_level};
use chanlog::severity::UnknownSeverity;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetGlobalLevel,
    GetChannelLevel(String),
    GetAllLevels,
    GetAllHandles,
    SetGlobalLevel(SeverityMessage),
    SetChannelLevel(String, SeverityMessage),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'help' for the list of commands")]
    Unknown(String),
    #[error("Missing argument '{0}='")]
    MissingArg(&'static str),
    #[error("Unexpected argument '{0}'")]
    UnexpectedArg(String),
    #[error("Could not convert log level string to valid log level: {0}")]
    Level(#[from] UnknownSeverity),
}

/// A line typed in the shell.
#[derive(Debug, PartialEq, Eq)]
pub enum ShellLine {
    Empty,
    Help,
    Exit,
    Run(Command),
}

#[derive(Default)]
struct ShellArgs {
    channel: Option<String>,
    level: Option<String>,
}

impl ShellArgs {
    fn parse<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<Self, CommandError> {
        let mut args = ShellArgs::default();
        for token in tokens {
            match token.split_once('=') {
                Some(("channel", value)) if !value.is_empty() => {
                    args.channel = Some(value.to_owned());
                }
                Some(("level", value)) if !value.is_empty() => {
                    args.level = Some(value.to_owned());
                }
                _ => return Err(CommandError::UnexpectedArg(token.to_owned())),
            }
        }
        Ok(args)
    }
    fn channel(&mut self) -> Result<String, CommandError> {
        self.channel.take().ok_or(CommandError::MissingArg("channel"))
    }
    fn level(&mut self) -> Result<SeverityMessage, CommandError> {
        let level = self.level.take().ok_or(CommandError::MissingArg("level"))?;
        Ok(parse_level(&level)?)
    }
    fn finish(self, command: Command) -> Result<Command, CommandError> {
        if let Some(channel) = self.channel {
            return Err(CommandError::UnexpectedArg(format!("channel={channel}")));
        }
        if let Some(level) = self.level {
            return Err(CommandError::UnexpectedArg(format!("level={level}")));
        }
        Ok(command)
    }
}

/// Parse a shell line: a command name followed by `name=value` arguments.
pub fn parse_shell_line(line: &str) -> Result<ShellLine, CommandError> {
    let mut tokens = line.split_whitespace();
    let Some(name) = tokens.next() else {
        return Ok(ShellLine::Empty);
    };
    let mut args = ShellArgs::parse(tokens)?;
    let command = match name.to_ascii_lowercase().as_str() {
        "help" | "?" => return args.finish(Command::GetGlobalLevel).map(|_| ShellLine::Help),
        "exit" | "quit" => return Ok(ShellLine::Exit),
        "getgloballevel" => Command::GetGlobalLevel,
        "getchannellevel" => Command::GetChannelLevel(args.channel()?),
        "getalllevels" => Command::GetAllLevels,
        "getallhandles" => Command::GetAllHandles,
        "setgloballevel" => Command::SetGlobalLevel(args.level()?),
        "setchannellevel" => {
            let channel = args.channel()?;
            Command::SetChannelLevel(channel, args.level()?)
        }
        _ => return Err(CommandError::Unknown(name.to_owned())),
    };
    args.finish(command).map(ShellLine::Run)
}

impl Command {
    pub fn request(&self) -> CtlRequest {
        match self {
            Command::GetGlobalLevel => CtlRequest::GetDefaultLogLevel,
            Command::GetChannelLevel(channel) => CtlRequest::GetChannelLogLevel {
                channel: channel.clone(),
            },
            Command::GetAllLevels => CtlRequest::GetAllLogLevels,
            Command::GetAllHandles => CtlRequest::GetAllLogHandles,
            Command::SetGlobalLevel(severity) => CtlRequest::SetDefaultLogLevel(*severity),
            Command::SetChannelLevel(channel, severity) => CtlRequest::SetChannelSeverity {
                channel: channel.clone(),
                severity: *severity,
            },
        }
    }
}

/// Render a successful response.
pub fn render<W: Write>(response: &CtlResponse, out: &mut W) -> io::Result<()> {
    match response {
        CtlResponse::Severity(severity) => writeln!(out, "Level: {severity}"),
        CtlResponse::Done => Ok(()),
        CtlResponse::Levels(levels) => {
            for (handle, severity) in levels.iter().filter(|(h, _)| !h.is_empty()) {
                writeln!(out, "Handle = {handle}, Log Level = {severity}")?;
            }
            Ok(())
        }
        CtlResponse::Handles(handles) => {
            for handle in handles.iter().filter(|h| !h.is_empty()) {
                writeln!(out, "Handle = {handle}")?;
            }
            Ok(())
        }
        CtlResponse::Error(status) => writeln!(out, "{}", status.message),
    }
}

fn failure_message(error: &CtlError) -> String {
    match error {
        CtlError::Status(status) => status.message.clone(),
        other => other.to_string(),
    }
}

/// Run `command` against the target, writing the outcome to `out`.
/// Returns false if the call failed.
pub async fn run_command<W: Write>(
    client: &mut ControlClient,
    command: &Command,
    out: &mut W,
) -> io::Result<bool> {
    let request = command.request();
    match client.call(&request).await {
        Ok(response) => {
            render(&response, out)?;
            Ok(true)
        }
        Err(e) => {
            tracing::debug!("{} failed: {e}", request.op_name());
            writeln!(
                out,
                "Failed to call '{}' -> {}",
                request.op_name(),
                failure_message(&e)
            )?;
            Ok(false)
        }
    }
}
