// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Channel registry: the set of known channels and their thresholds.

use crate::filter::SeverityFilter;
use crate::severity::{AtomicSeverity, Severity};
use arc_swap::ArcSwap;
use linkme::distributed_slice;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A channel declared at compile time with [`crate::declare_channel`].
#[derive(Debug)]
pub struct ChannelDecl {
    pub name: &'static str,
    pub severity: Option<Severity>,
}
impl ChannelDecl {
    #[must_use]
    pub const fn new(name: &'static str, severity: Option<Severity>) -> Self {
        Self { name, severity }
    }
}

#[distributed_slice]
pub static DECLARED_CHANNELS: [ChannelDecl];

/// Declare a channel so that it exists, and can be tuned externally, before its first emission.
///
/// ```ignore
/// chanlog::declare_channel!("net");
/// chanlog::declare_channel!("net-verbose", chanlog::Severity::Debug2);
/// ```
#[macro_export]
macro_rules! declare_channel {
    ($name:expr) => {
        const _: () = {
            #[$crate::linkme::distributed_slice($crate::registry::DECLARED_CHANNELS)]
            #[linkme(crate = $crate::linkme)]
            static CHANNEL_DECL: $crate::registry::ChannelDecl =
                $crate::registry::ChannelDecl::new($name, None);
        };
    };
    ($name:expr, $severity:expr) => {
        const _: () = {
            #[$crate::linkme::distributed_slice($crate::registry::DECLARED_CHANNELS)]
            #[linkme(crate = $crate::linkme)]
            static CHANNEL_DECL: $crate::registry::ChannelDecl =
                $crate::registry::ChannelDecl::new($name, Some($severity));
        };
    };
}

/// Concurrent map from channel name to threshold, plus the live filter derived from it.
///
/// The map and the filter are only ever mutated together, under the same lock.
/// The global default lives outside the lock since it is read on every emission.
#[derive(Debug)]
pub struct ChannelRegistry {
    channels: Mutex<HashMap<Arc<str>, Severity>>,
    default: AtomicSeverity,
    filter: ArcSwap<SeverityFilter>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}

impl ChannelRegistry {
    #[must_use]
    pub fn new(default: Severity) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            default: AtomicSeverity::new(default),
            filter: ArcSwap::from_pointee(SeverityFilter::new()),
        }
    }

    fn install_filter(&self, channels: &HashMap<Arc<str>, Severity>) {
        self.filter.store(Arc::new(SeverityFilter::from_map(channels)));
    }

    /// Look up a channel, creating it with the current global default if missing.
    /// Concurrent callers for the same name all get the same interned name back.
    pub fn get_or_create(&self, name: &str) -> Arc<str> {
        let mut channels = self.channels.lock();
        if let Some((key, _)) = channels.get_key_value(name) {
            return key.clone();
        }
        let key: Arc<str> = Arc::from(name);
        channels.insert(key.clone(), self.default.load());
        self.install_filter(&channels);
        key
    }

    /// Set the threshold of an existing channel. Returns false, changing nothing, if the
    /// channel was never created.
    pub fn set_severity(&self, name: &str, severity: Severity) -> bool {
        let mut channels = self.channels.lock();
        let Some(current) = channels.get_mut(name) else {
            return false;
        };
        *current = severity;
        self.install_filter(&channels);
        true
    }

    /// Set the default for channels created from now on, and apply it to every existing channel.
    pub fn set_global_default(&self, severity: Severity) {
        let mut channels = self.channels.lock();
        self.default.store(severity);
        for threshold in channels.values_mut() {
            *threshold = severity;
        }
        self.install_filter(&channels);
    }

    /// Threshold of a channel, or the global default if the channel does not exist.
    #[must_use]
    pub fn severity(&self, name: &str) -> Severity {
        self.channels
            .lock()
            .get(name)
            .copied()
            .unwrap_or_else(|| self.default.load())
    }

    #[must_use]
    pub fn global_default(&self) -> Severity {
        self.default.load()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.channels.lock().contains_key(name)
    }

    #[must_use]
    pub fn all_severities(&self) -> BTreeMap<String, Severity> {
        self.channels
            .lock()
            .iter()
            .map(|(name, sev)| (name.to_string(), *sev))
            .collect()
    }

    #[must_use]
    pub fn all_channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .channels
            .lock()
            .keys()
            .map(ToString::to_string)
            .collect();
        names.sort();
        names
    }

    /// Emission-path check. Lock free.
    #[must_use]
    pub fn should_emit(&self, channel: &str, severity: Severity) -> bool {
        if severity == Severity::Internal {
            return true;
        }
        self.filter
            .load()
            .should_emit(channel, severity, self.default.load())
    }

    /// Current filter snapshot.
    #[must_use]
    pub fn filter(&self) -> Arc<SeverityFilter> {
        self.filter.load_full()
    }

    /// Create every channel declared with [`crate::declare_channel`].
    pub fn register_declared(&self) {
        for decl in DECLARED_CHANNELS {
            self.get_or_create(decl.name);
            if let Some(severity) = decl.severity {
                self.set_severity(decl.name, severity);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread;

    #[test]
    fn get_or_create_is_idempotent_across_threads() {
        let registry = ChannelRegistry::new(Severity::Warning);
        let handles: Vec<Arc<str>> = thread::scope(|s| {
            let workers: Vec<_> = (0..16)
                .map(|_| s.spawn(|| registry.get_or_create("shared")))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        let first = &handles[0];
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, first)));
        assert_eq!(registry.all_channels(), vec!["shared".to_string()]);
        assert_eq!(registry.severity("shared"), Severity::Warning);
    }

    #[test]
    fn new_channels_are_seeded_with_default() {
        let registry = ChannelRegistry::new(Severity::Error);
        registry.get_or_create("a");
        assert_eq!(registry.severity("a"), Severity::Error);
        assert_eq!(registry.filter().threshold("a"), Some(Severity::Error));
    }

    #[test]
    fn global_default_is_retroactive_and_seeds_new_channels() {
        let registry = ChannelRegistry::new(Severity::Info);
        registry.get_or_create("before");
        registry.get_or_create("overridden");
        registry.set_severity("overridden", Severity::Fatal);

        registry.set_global_default(Severity::Warning2);
        registry.get_or_create("after");

        assert_eq!(registry.global_default(), Severity::Warning2);
        assert_eq!(registry.severity("before"), Severity::Warning2);
        assert_eq!(registry.severity("overridden"), Severity::Warning2);
        assert_eq!(registry.severity("after"), Severity::Warning2);
        assert_eq!(registry.filter().threshold("before"), Some(Severity::Warning2));
    }

    #[test]
    fn unknown_channel_queries_never_fail() {
        let registry = ChannelRegistry::new(Severity::Debug);
        assert_eq!(registry.severity("never-created"), Severity::Debug);
        assert!(!registry.set_severity("never-created", Severity::Error));
        assert!(!registry.contains("never-created"));
        assert!(registry.all_severities().is_empty());
        assert!(registry.filter().is_empty());
    }

    #[test]
    fn set_severity_updates_filter() {
        let registry = ChannelRegistry::new(Severity::Warning);
        registry.get_or_create("net");
        assert!(!registry.should_emit("net", Severity::Info));
        assert!(registry.set_severity("net", Severity::Info));
        assert!(registry.should_emit("net", Severity::Info));
        assert_eq!(registry.filter().threshold("net"), Some(Severity::Info));
    }

    #[test]
    fn listing() {
        let registry = ChannelRegistry::new(Severity::Info);
        registry.get_or_create("b");
        registry.get_or_create("a");
        registry.set_severity("b", Severity::Error2);
        let all = registry.all_severities();
        assert_eq!(all.get("a"), Some(&Severity::Info));
        assert_eq!(all.get("b"), Some(&Severity::Error2));
        assert_eq!(registry.all_channels(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn concurrent_readers_see_consistent_filter() {
        let registry = ChannelRegistry::new(Severity::Info);
        registry.get_or_create("hot");
        thread::scope(|s| {
            s.spawn(|| {
                for i in 0..500 {
                    let sev = if i % 2 == 0 {
                        Severity::Error
                    } else {
                        Severity::Info
                    };
                    registry.set_severity("hot", sev);
                }
            });
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..500 {
                        // Fatal passes either threshold, Debug2 never passes Error
                        assert!(registry.should_emit("hot", Severity::Fatal));
                        let threshold = registry.filter().threshold("hot");
                        assert!(matches!(
                            threshold,
                            Some(Severity::Error | Severity::Info)
                        ));
                    }
                });
            }
        });
    }
}
