// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Interactive shell

use crate::cmdtree::{Node, Prefetcher, build_cmdtree};
use crate::commands::{ShellLine, parse_shell_line, run_command};
use crate::completions::CmdCompleter;
use chanlog::ctl::ControlClient;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Editor};
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

fn print_help<W: Write>(tree: &Node, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "Commands:".bold())?;
    for node in tree.children.values() {
        let args: Vec<String> = node
            .args
            .iter()
            .map(|a| format!("{}=<{}>", a.name, a.name))
            .collect();
        writeln!(
            out,
            "  {:<16} {:<28} {}",
            node.name.green(),
            args.join(" "),
            node.description
        )?;
    }
    Ok(())
}

pub struct Shell {
    rt: Rc<Runtime>,
    client: ControlClient,
    prompt: String,
}

impl Shell {
    pub fn new(rt: Rc<Runtime>, client: ControlClient, target: &str, pid: u32) -> Self {
        Self {
            rt,
            client,
            prompt: format!("{target}[{pid}]> "),
        }
    }

    /// Channel names of the target, for completion. Uses a connection of its own.
    fn channel_prefetcher(&self, path: PathBuf) -> Prefetcher {
        let rt = self.rt.clone();
        Rc::new(move || {
            rt.block_on(async {
                let mut client = ControlClient::connect(&path).await?;
                client.get_all_channels().await
            })
            .unwrap_or_else(|e| {
                debug!("Could not fetch channels: {e}");
                Vec::new()
            })
        })
    }

    pub fn run(&mut self, socket: PathBuf) -> rustyline::Result<()> {
        let tree = Rc::new(build_cmdtree(self.channel_prefetcher(socket)));
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .auto_add_history(true)
            .build();
        let mut editor: Editor<CmdCompleter, DefaultHistory> = Editor::with_config(config)?;
        editor.set_helper(Some(CmdCompleter::new(tree.clone())));

        let mut stdout = io::stdout();
        loop {
            let line = match editor.readline(&self.prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e),
            };
            match parse_shell_line(&line) {
                Ok(ShellLine::Empty) => {}
                Ok(ShellLine::Help) => print_help(&tree, &mut stdout)?,
                Ok(ShellLine::Exit) => break,
                Ok(ShellLine::Run(command)) => {
                    let ok = self
                        .rt
                        .block_on(run_command(&mut self.client, &command, &mut stdout))?;
                    if !ok {
                        warn!("Command {command:?} failed");
                    }
                }
                Err(e) => writeln!(stdout, "{}", e.to_string().red())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn help_lists_every_command() {
        colored::control::set_override(false);
        let tree = build_cmdtree(Rc::new(Vec::<String>::new));
        let mut out = Vec::new();
        print_help(&tree, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("Commands:\n"));
        for name in tree.children.keys() {
            assert!(out.contains(name.as_str()));
        }
        assert!(out.contains("channel=<channel> level=<level>"));
    }
}
