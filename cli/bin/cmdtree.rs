// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Tree of shell commands, used for completion and help

use chanlog::Severity;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Fetches candidate values of an argument at completion time.
pub type Prefetcher = Rc<dyn Fn() -> Vec<String>>;

pub struct NodeArg {
    pub name: String,
    pub choices: Vec<String>,
    pub prefetcher: Option<Prefetcher>,
}

impl NodeArg {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            choices: Vec::new(),
            prefetcher: None,
        }
    }
    #[must_use]
    pub fn choices<I: IntoIterator<Item = String>>(mut self, choices: I) -> Self {
        self.choices = choices.into_iter().collect();
        self
    }
    #[must_use]
    pub fn prefetcher(mut self, prefetcher: Prefetcher) -> Self {
        self.prefetcher = Some(prefetcher);
        self
    }
}

#[derive(Default)]
pub struct Node {
    pub name: String,
    pub description: String,
    pub children: BTreeMap<String, Node>,
    pub args: Vec<NodeArg>,
}

impl Node {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            ..Default::default()
        }
    }
    #[must_use]
    pub fn child(mut self, child: Node) -> Self {
        self.children.insert(child.name.clone(), child);
        self
    }
    #[must_use]
    pub fn arg(mut self, arg: NodeArg) -> Self {
        self.args.push(arg);
        self
    }
    pub fn find_arg(&self, name: &str) -> Option<&NodeArg> {
        self.args.iter().find(|a| a.name == name)
    }
}

fn level_choices() -> Vec<String> {
    Severity::ALL
        .into_iter()
        .filter(|s| *s != Severity::Internal)
        .map(|s| s.name().to_owned())
        .collect()
}

/// Build the shell command tree. `channels` lists the channels of the target.
pub fn build_cmdtree(channels: Prefetcher) -> Node {
    let channel_arg = || NodeArg::new("channel").prefetcher(channels.clone());
    let level_arg = || NodeArg::new("level").choices(level_choices());

    Node::new("", "")
        .child(Node::new("GetGlobalLevel", "Get the global/default log level"))
        .child(
            Node::new("GetChannelLevel", "Get the log level of a channel").arg(channel_arg()),
        )
        .child(Node::new("GetAllLevels", "Get all channels and their log level"))
        .child(Node::new("GetAllHandles", "Get all channels"))
        .child(Node::new("SetGlobalLevel", "Set the global/default log level").arg(level_arg()))
        .child(
            Node::new("SetChannelLevel", "Set the log level of a channel")
                .arg(channel_arg())
                .arg(level_arg()),
        )
        .child(Node::new("help", "Show this help"))
        .child(Node::new("exit", "Leave the shell"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tree_shape() {
        let tree = build_cmdtree(Rc::new(Vec::<String>::new));
        assert_eq!(tree.children.len(), 8);
        let set = &tree.children["SetChannelLevel"];
        assert!(set.find_arg("channel").unwrap().prefetcher.is_some());
        let level = set.find_arg("level").unwrap();
        assert!(level.choices.contains(&"WARNING2".to_string()));
        assert!(!level.choices.contains(&"INTERNAL".to_string()));
        assert!(tree.children["GetAllLevels"].args.is_empty());
    }
}
