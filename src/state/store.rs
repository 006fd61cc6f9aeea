//! The reactive store: per-key change detection, subscription, notification.

use super::value::StateValue;
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Full store state: key to current value.
pub type StateMap = HashMap<String, StateValue>;

/// Callback invoked with the key's new value and the full committed snapshot.
pub type Subscriber = Arc<dyn Fn(&StateValue, &StateMap) -> Result<()> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SubscriberId(u64);

struct Entry {
    id: SubscriberId,
    callback: Subscriber,
}

struct Inner {
    state: StateMap,
    listeners: HashMap<String, Vec<Entry>>,
    next_id: u64,
}

/// Keyed observable state container.
///
/// One store is created per page load and lives for the lifetime of the page.
/// Clones share the same state. Listener callbacks run without the store lock
/// held, so they may read the store, apply further updates, or detach
/// subscriptions.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<Inner>>,
}

impl Store {
    /// Create a store owning `initial`. The store takes the values over, so
    /// the caller keeps no alias that could bypass change detection.
    pub fn new(initial: StateMap) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: initial,
                listeners: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Current committed state. Container values are shared handles, not
    /// copies; the snapshot is stable even while later updates commit.
    pub fn snapshot(&self) -> StateMap {
        self.inner.lock().state.clone()
    }

    /// Current value for one key, [`StateValue::Null`] when absent.
    pub fn get(&self, key: &str) -> StateValue {
        self.inner
            .lock()
            .state
            .get(key)
            .cloned()
            .unwrap_or(StateValue::Null)
    }

    /// Apply a partial state transition.
    ///
    /// Every changed key is committed before any subscriber runs, so each
    /// callback sees the fully committed snapshot. Subscribers for a key run
    /// in registration order; unchanged keys produce no notifications. A
    /// failing callback is logged and skipped without stopping the pass.
    /// Never fails.
    pub fn update<I>(&self, partial: I)
    where
        I: IntoIterator<Item = (String, StateValue)>,
    {
        let snapshot;
        let mut plan: Vec<(String, StateValue, Vec<(SubscriberId, Subscriber)>)> = Vec::new();
        {
            let mut inner = self.inner.lock();
            let mut changed: Vec<String> = Vec::new();
            for (key, value) in partial {
                let unchanged = inner
                    .state
                    .get(&key)
                    .is_some_and(|current| current.same_as(&value));
                if unchanged {
                    continue;
                }
                inner.state.insert(key.clone(), value);
                if !changed.contains(&key) {
                    changed.push(key);
                }
            }
            snapshot = inner.state.clone();
            for key in changed {
                let subscribers = inner
                    .listeners
                    .get(&key)
                    .map(|entries| {
                        entries
                            .iter()
                            .map(|entry| (entry.id, Arc::clone(&entry.callback)))
                            .collect()
                    })
                    .unwrap_or_default();
                let value = snapshot.get(&key).cloned().unwrap_or(StateValue::Null);
                plan.push((key, value, subscribers));
            }
        }

        for (key, value, subscribers) in plan {
            for (id, callback) in subscribers {
                // A callback earlier in the pass may have detached this one.
                if !self.is_registered(&key, id) {
                    continue;
                }
                if let Err(error) = callback(&value, &snapshot) {
                    tracing::error!(key = %key, %error, "state listener failed");
                }
            }
        }
    }

    /// Register `callback` for future changes to `key`.
    ///
    /// Registration is a set keyed by callback handle: passing the same
    /// [`Subscriber`] handle twice keeps the original slot, so it fires once
    /// per notification. Subscribing to a key with no current value is legal
    /// and waits for a future update.
    #[must_use = "dropping the subscription handle detaches the listener"]
    pub fn subscribe(&self, key: impl Into<String>, callback: Subscriber) -> Subscription {
        let key = key.into();
        let mut inner = self.inner.lock();
        let existing = inner.listeners.get(&key).and_then(|entries| {
            entries
                .iter()
                .find(|entry| Arc::ptr_eq(&entry.callback, &callback))
                .map(|entry| entry.id)
        });
        let id = match existing {
            Some(id) => id,
            None => {
                inner.next_id += 1;
                let id = SubscriberId(inner.next_id);
                inner
                    .listeners
                    .entry(key.clone())
                    .or_default()
                    .push(Entry { id, callback });
                id
            }
        };
        Subscription {
            inner: Arc::downgrade(&self.inner),
            key,
            id,
        }
    }

    fn is_registered(&self, key: &str, id: SubscriberId) -> bool {
        self.inner
            .lock()
            .listeners
            .get(key)
            .is_some_and(|entries| entries.iter().any(|entry| entry.id == id))
    }
}

/// Handle detaching one listener. Detaches on drop; detaching twice (or after
/// the store is gone) is a no-op. Safe to drop from inside a notification
/// callback: the removed listener will not run again, including later in the
/// same pass.
#[must_use = "dropping the subscription handle detaches the listener"]
pub struct Subscription {
    inner: Weak<Mutex<Inner>>,
    key: String,
    id: SubscriberId,
}

impl Subscription {
    /// Detach now.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.lock();
            if let Some(entries) = inner.listeners.get_mut(&self.key) {
                entries.retain(|entry| entry.id != self.id);
                // Empty listener sets are discarded to keep the map bounded.
                if entries.is_empty() {
                    inner.listeners.remove(&self.key);
                }
            }
        }
    }
}
