// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Cmd line of the management tool

use crate::commands::{Command, CommandError};
use chanlog::ctl::discovery::DEFAULT_SOCKET_DIR;
use chanlog::ctl::parse_level;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

const LEVELS_HELP: &str = "\
Valid log levels:
    INFO
    DEBUG    DEBUG2
    WARNING  WARNING2  (or WARN, WARN2)
    ERROR    ERROR2    (or ERR, ERR2)
    FATAL

The '2' variants omit the source location of records. Levels are case insensitive.";

#[derive(Parser, Debug)]
#[command(
    name = "chanlogctl",
    about = "Inspect and change the log levels of a running program",
    long_about = None,
    after_help = LEVELS_HELP
)]
#[command(group(ArgGroup::new("action").multiple(false)))]
pub struct Cmdline {
    #[arg(value_name = "NAME", help = "Name of the program to manage")]
    pub name: String,

    #[arg(short, long, help = "PID of the program to manage")]
    pub pid: Option<u32>,

    #[arg(
        long,
        value_name = "DIR",
        default_value = DEFAULT_SOCKET_DIR,
        help = "Directory holding the control sockets"
    )]
    pub socket_dir: PathBuf,

    #[arg(long, group = "action", help = "Enter an interactive shell (default)")]
    pub shell: bool,

    #[arg(long, group = "action", help = "Get the default/global log level")]
    pub get_default_level: bool,

    #[arg(
        long,
        group = "action",
        value_name = "CHANNEL",
        help = "Get the level of a specific log channel"
    )]
    pub get_channel_level: Option<String>,

    #[arg(long, group = "action", help = "Get all log channels and their level")]
    pub get_all_levels: bool,

    #[arg(long, group = "action", help = "Get all log channels")]
    pub get_all_channels: bool,

    #[arg(
        long,
        group = "action",
        value_name = "LEVEL",
        help = "Set the default/global log level"
    )]
    pub set_default_level: Option<String>,

    #[arg(
        long,
        group = "action",
        num_args = 2,
        value_names = ["CHANNEL", "LEVEL"],
        help = "Set the level of a specific log channel"
    )]
    pub set_channel_level: Option<Vec<String>>,
}

/// What to do once connected.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Shell,
    Run(Command),
}

impl Cmdline {
    pub fn action(&self) -> Result<Action, CommandError> {
        if let Some(channel) = &self.get_channel_level {
            return Ok(Action::Run(Command::GetChannelLevel(channel.clone())));
        }
        if let Some(level) = &self.set_default_level {
            return Ok(Action::Run(Command::SetGlobalLevel(parse_level(level)?)));
        }
        if let Some(values) = &self.set_channel_level {
            let [channel, level] = values.as_slice() else {
                return Err(CommandError::MissingArg("level"));
            };
            return Ok(Action::Run(Command::SetChannelLevel(
                channel.clone(),
                parse_level(level)?,
            )));
        }
        Ok(if self.get_default_level {
            Action::Run(Command::GetGlobalLevel)
        } else if self.get_all_levels {
            Action::Run(Command::GetAllLevels)
        } else if self.get_all_channels {
            Action::Run(Command::GetAllHandles)
        } else {
            Action::Shell
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chanlog::Severity;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<Cmdline, clap::Error> {
        Cmdline::try_parse_from(std::iter::once("chanlogctl").chain(args.iter().copied()))
    }

    #[test]
    fn shell_is_the_default() {
        let cmdline = parse(&["demo"]).unwrap();
        assert_eq!(cmdline.name, "demo");
        assert_eq!(cmdline.pid, None);
        assert_eq!(cmdline.socket_dir, PathBuf::from(DEFAULT_SOCKET_DIR));
        assert_eq!(cmdline.action().unwrap(), Action::Shell);
        assert_eq!(parse(&["demo", "--shell"]).unwrap().action().unwrap(), Action::Shell);
    }

    #[test]
    fn one_shot_actions() {
        let cmdline = parse(&["demo", "-p", "42", "--set-channel-level", "net", "warn2"]).unwrap();
        assert_eq!(cmdline.pid, Some(42));
        assert_eq!(
            cmdline.action().unwrap(),
            Action::Run(Command::SetChannelLevel(
                "net".to_string(),
                Severity::Warning2.into()
            ))
        );
        assert_eq!(
            parse(&["demo", "--get-channel-level", "net"]).unwrap().action().unwrap(),
            Action::Run(Command::GetChannelLevel("net".to_string()))
        );
        assert_eq!(
            parse(&["demo", "--get-all-channels"]).unwrap().action().unwrap(),
            Action::Run(Command::GetAllHandles)
        );
    }

    #[test]
    fn at_most_one_action() {
        assert!(parse(&["demo", "--get-all-levels", "--get-default-level"]).is_err());
        assert!(parse(&["--get-all-levels"]).is_err());
    }

    #[test]
    fn bad_level_is_an_error() {
        let cmdline = parse(&["demo", "--set-default-level", "loud"]).unwrap();
        assert!(matches!(cmdline.action(), Err(CommandError::Level(_))));
    }
}
