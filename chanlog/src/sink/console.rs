// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use super::Sink;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Where console output goes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    /// No console output at all.
    None,
    /// The standard log stream. Unbuffered, on file descriptor 2.
    #[default]
    Stdlog,
    Stderr,
    Stdout,
}

#[derive(Debug)]
pub struct ConsoleSink {
    target: ConsoleTarget,
}

impl ConsoleSink {
    /// Build a console sink. Returns `None` for [`ConsoleTarget::None`].
    #[must_use]
    pub fn new(target: ConsoleTarget) -> Option<Self> {
        (target != ConsoleTarget::None).then_some(Self { target })
    }

    #[must_use]
    pub fn target(&self) -> ConsoleTarget {
        self.target
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn consume(&self, record: &Record) {
        // the std handles serialize concurrent writers through their own locks
        let _ = match self.target {
            ConsoleTarget::None => Ok(()),
            ConsoleTarget::Stdlog => writeln!(std::io::stderr().lock(), "{record}"),
            ConsoleTarget::Stderr => {
                let mut out = std::io::stderr().lock();
                writeln!(out, "{record}").and_then(|()| out.flush())
            }
            ConsoleTarget::Stdout => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{record}").and_then(|()| out.flush())
            }
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn none_target_builds_no_sink() {
        assert!(ConsoleSink::new(ConsoleTarget::None).is_none());
        let sink = ConsoleSink::new(ConsoleTarget::Stdout).unwrap();
        assert_eq!(sink.target(), ConsoleTarget::Stdout);
        assert_eq!(ConsoleTarget::default(), ConsoleTarget::Stdlog);
    }

    #[test]
    fn target_names() {
        let target: ConsoleTarget = serde_json::from_str("\"stderr\"").unwrap();
        assert_eq!(target, ConsoleTarget::Stderr);
        assert_eq!(serde_json::to_string(&ConsoleTarget::None).unwrap(), "\"none\"");
    }
}
