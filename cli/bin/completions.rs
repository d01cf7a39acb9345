// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Shell command completions

use crate::cmdtree::Node;
use rustyline::Helper;
use rustyline::completion::Completer;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use std::rc::Rc;

#[derive(Default)]
pub struct CmdCompleter {
    cmdtree: Rc<Node>,
}

impl CmdCompleter {
    pub fn new(cmdtree: Rc<Node>) -> Self {
        Self { cmdtree }
    }
}

impl Hinter for CmdCompleter {
    type Hint = String;
}
impl Highlighter for CmdCompleter {}
impl Validator for CmdCompleter {}
impl Helper for CmdCompleter {}

impl Completer for CmdCompleter {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let input = &line[..pos];
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let mut candidates = Vec::new();

        let (path_tokens, last) = if input.is_empty() || input.ends_with(' ') {
            (tokens.as_slice(), "")
        } else {
            let (path, last) = tokens.split_at(tokens.len().saturating_sub(1));
            (path, last.first().copied().unwrap_or(""))
        };

        // walk down from the root, stopping at the first argument
        let mut node = self.cmdtree.as_ref();
        for token in path_tokens {
            if token.contains('=') {
                break;
            }
            match node.children.get(*token) {
                Some(child) => node = child,
                None => return Ok((pos - last.len(), candidates)),
            }
        }

        // arg=value: offer the values of a known argument, filtered by what was typed
        if let Some((name, value)) = last.split_once('=') {
            if let Some(arg) = node.find_arg(name) {
                candidates.extend(arg.choices.iter().cloned());
                if let Some(prefetch) = &arg.prefetcher {
                    candidates.extend(prefetch());
                }
                let value_lc = value.to_ascii_lowercase();
                candidates.retain(|c| c.to_ascii_lowercase().starts_with(&value_lc));
                return Ok((pos - value.len(), candidates));
            }
            return Ok((pos - last.len(), candidates));
        }

        // arguments not typed yet
        for arg in &node.args {
            let typed = path_tokens
                .iter()
                .any(|t| t.split_once('=').is_some_and(|(name, _)| name == arg.name));
            if arg.name.starts_with(last) && !typed {
                candidates.push(format!("{}=", arg.name));
            }
        }

        for child in node.children.values() {
            if child.name.starts_with(last) {
                candidates.push(child.name.clone());
            }
        }

        Ok((pos - last.len(), candidates))
    }
}
