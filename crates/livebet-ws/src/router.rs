//! Typed event routing.
//!
//! Maps event kinds to subscriber callbacks, plus a wildcard channel that
//! receives every event. Dispatch is synchronous: kind-specific subscribers
//! first (registration order), then wildcard subscribers. A panicking
//! subscriber is isolated and does not stop the rest of the dispatch.

use crate::message::{EventKind, FeedEvent};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::error;

type EventCallback = Arc<dyn Fn(&FeedEvent) + Send + Sync>;

/// Subscription key: a concrete kind, or the wildcard channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Channel {
    Kind(EventKind),
    Wildcard,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    channels: HashMap<Channel, Vec<(u64, EventCallback)>>,
}

impl Registry {
    fn insert(&mut self, channel: Channel, callback: EventCallback) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.channels.entry(channel).or_default().push((id, callback));
        id
    }

    fn remove(&mut self, channel: Channel, id: u64) {
        if let Some(subscribers) = self.channels.get_mut(&channel) {
            subscribers.retain(|(sub_id, _)| *sub_id != id);
            if subscribers.is_empty() {
                self.channels.remove(&channel);
            }
        }
    }
}

/// Publish/subscribe registry for decoded feed events.
#[derive(Clone, Default)]
pub struct EventRouter {
    registry: Arc<RwLock<Registry>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one event kind. The returned handle removes
    /// exactly this callback when unsubscribed.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&FeedEvent) + Send + Sync + 'static,
    {
        self.subscribe_channel(Channel::Kind(kind), Arc::new(callback))
    }

    /// Register a callback for every event regardless of kind.
    pub fn subscribe_any<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&FeedEvent) + Send + Sync + 'static,
    {
        self.subscribe_channel(Channel::Wildcard, Arc::new(callback))
    }

    fn subscribe_channel(&self, channel: Channel, callback: EventCallback) -> Subscription {
        let id = self.registry.write().insert(channel, callback);
        Subscription {
            registry: Arc::downgrade(&self.registry),
            channel,
            id,
        }
    }

    /// Dispatch one event: kind-specific subscribers in registration order,
    /// then wildcard subscribers. Each callback is panic-isolated.
    pub fn dispatch(&self, event: &FeedEvent) {
        let callbacks: Vec<EventCallback> = {
            let registry = self.registry.read();
            let mut callbacks = Vec::new();
            for channel in [Channel::Kind(event.kind()), Channel::Wildcard] {
                if let Some(subscribers) = registry.channels.get(&channel) {
                    callbacks.extend(subscribers.iter().map(|(_, cb)| cb.clone()));
                }
            }
            callbacks
        };

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                error!(kind = %event.kind(), "Event subscriber panicked");
            }
        }
    }

    /// Number of subscribers registered for a kind (tests and diagnostics).
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry
            .read()
            .channels
            .get(&Channel::Kind(kind))
            .map_or(0, Vec::len)
    }
}

/// Handle returned by `subscribe`; removes the callback on `unsubscribe`.
pub struct Subscription {
    registry: Weak<RwLock<Registry>>,
    channel: Channel,
    id: u64,
}

impl Subscription {
    /// Remove exactly this callback from exactly this channel.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.write().remove(self.channel, self.id);
        }
    }
}
