//! Change-notification feed backing the gateway's realtime subscriptions.
//!
//! Mutations broadcast a [`ChangeEvent`] into each matching subscription's
//! bounded buffer; `pump` later hands the queued events to their handlers.
//! The split mirrors the event loop the portal runs on: pushes arrive at any
//! time, handlers run between other callbacks. Handlers never run under the
//! feed lock, so they may query the gateway or detach subscriptions.

use crate::gateway::{ChangeEvent, ChangeHandler};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Unique identifier for a feed subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeedId(pub u64);

struct FeedSubscription {
    collection: String,
    handler: ChangeHandler,
    sender: Sender<ChangeEvent>,
    receiver: Receiver<ChangeEvent>,
}

/// Buffers change events per subscription and delivers them on demand.
pub struct ChangeFeed {
    subscriptions: RwLock<HashMap<FeedId, FeedSubscription>>,
    next_id: AtomicU64,
    buffer_size: usize,
}

impl ChangeFeed {
    pub fn new(buffer_size: usize) -> Arc<Self> {
        Arc::new(Self {
            subscriptions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            buffer_size,
        })
    }

    /// Open a push channel for `collection`. Dropping the returned handle
    /// detaches it.
    pub fn subscribe(self: &Arc<Self>, collection: &str, handler: ChangeHandler) -> RealtimeHandle {
        let id = FeedId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let (sender, receiver) = bounded(self.buffer_size);
        self.subscriptions.write().insert(
            id,
            FeedSubscription {
                collection: collection.to_string(),
                handler,
                sender,
                receiver,
            },
        );
        RealtimeHandle {
            feed: Arc::downgrade(self),
            id,
        }
    }

    /// Detach a subscription. Idempotent.
    pub fn detach(&self, id: FeedId) {
        self.subscriptions.write().remove(&id);
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Queue `event` for every subscription on its collection. A subscriber
    /// whose buffer is full is dropped, matching the platform's
    /// slow-consumer policy.
    pub fn broadcast(&self, event: &ChangeEvent) {
        let mut to_remove = Vec::new();
        {
            let subs = self.subscriptions.read();
            for (id, sub) in subs.iter() {
                if sub.collection != event.collection {
                    continue;
                }
                match sub.sender.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                        to_remove.push(*id);
                    }
                }
            }
        }
        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for id in to_remove {
                tracing::warn!(id = id.0, "dropping slow realtime subscriber");
                subs.remove(&id);
            }
        }
    }

    /// Deliver queued events to their handlers. Events queued by a handler
    /// during the pass are held for the next one.
    pub fn pump(&self) {
        let batches: Vec<(ChangeHandler, Vec<ChangeEvent>)> = {
            let subs = self.subscriptions.read();
            subs.values()
                .map(|sub| {
                    (
                        Arc::clone(&sub.handler),
                        sub.receiver.try_iter().collect::<Vec<_>>(),
                    )
                })
                .filter(|(_, events)| !events.is_empty())
                .collect()
        };
        for (handler, events) in batches {
            for event in events {
                handler(&event);
            }
        }
    }
}

/// Detach-on-drop handle for a realtime subscription. Page teardown is the
/// only cancellation point: controllers hold their handles for the page
/// lifetime and drop them all at once.
#[must_use = "dropping the handle detaches the subscription"]
pub struct RealtimeHandle {
    feed: Weak<ChangeFeed>,
    id: FeedId,
}

impl RealtimeHandle {
    /// Detach now.
    pub fn detach(self) {}
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.upgrade() {
            feed.detach(self.id);
        }
    }
}
