// src/dag/signal.rs

//! Owned, name-keyed signal dispatcher.
//!
//! A signal name maps to an ordered list of subscribers. Subscribers are
//! plain values (e.g. slot indices); whoever owns the dispatcher decides
//! what publishing to each of them means. Everything runs on the owner's
//! scheduling task, so no interior mutability is needed.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Signals<S> {
    channels: HashMap<String, Vec<S>>,
}

impl<S> Default for Signals<S> {
    fn default() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }
}

impl<S> Signals<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `subscriber` to the list for `signal`.
    pub fn subscribe(&mut self, signal: impl Into<String>, subscriber: S) {
        self.channels.entry(signal.into()).or_default().push(subscriber);
    }

    /// Subscribers of `signal`, in subscription order.
    pub fn subscribers(&self, signal: &str) -> &[S] {
        self.channels
            .get(signal)
            .map(|subs| subs.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_subscribers(&self, signal: &str) -> bool {
        !self.subscribers(signal).is_empty()
    }

    /// Total number of subscriptions across all signals.
    pub fn len(&self) -> usize {
        self.channels.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
