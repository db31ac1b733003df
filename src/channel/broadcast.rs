//! Broadcast channel implementation
//!
//! Fans every published value out to all current subscribers. Each
//! subscriber has its own bounded queue, so subscribers are paced
//! independently.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;

use super::error::TrySendError;
use super::queue::Queue;
use super::subscription::Subscription;
use crate::error::BusError;
use crate::registry::TypeKey;

/// Values that can travel through a broadcast channel
///
/// Every subscriber receives its own clone, so cheap-to-clone types
/// (`Arc`, `bytes::Bytes`, small `Copy` structs) work best.
pub trait Event: Clone + Send + 'static {}

impl<T: Clone + Send + 'static> Event for T {}

/// Identity of one subscription within its channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Raw numeric id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Statistics for a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStats {
    /// Number of registered subscribers
    pub subscribers: usize,
    /// Per-subscriber queue capacity
    pub capacity: usize,
    /// Number of successful publish calls
    pub published: u64,
    /// Number of values accepted by subscriber queues
    pub delivered: u64,
    /// Whether the channel has been closed
    pub closed: bool,
}

struct Entry<T> {
    id: SubscriberId,
    queue: Arc<Queue<T>>,
}

struct Subscribers<T> {
    entries: Vec<Entry<T>>,
    closed: bool,
}

/// State shared between a channel, its clones and its subscriptions
pub(super) struct Shared<T> {
    key: TypeKey,
    capacity: usize,
    subscribers: Mutex<Subscribers<T>>,
    next_id: AtomicU64,
    published: AtomicU64,
    delivered: AtomicU64,
}

impl<T> Shared<T> {
    /// Remove a subscriber and close its queue.
    ///
    /// Both the id and the queue must match, so a subscription from another
    /// channel is never mistaken for one of ours.
    pub(super) fn remove(&self, id: SubscriberId, queue: &Arc<Queue<T>>) -> bool {
        let removed = {
            let mut subscribers = self.subscribers.lock();
            let position = subscribers
                .entries
                .iter()
                .position(|entry| entry.id == id && Arc::ptr_eq(&entry.queue, queue));

            match position {
                Some(idx) => {
                    subscribers.entries.remove(idx);
                    Some(subscribers.entries.len())
                }
                None => None,
            }
        };

        match removed {
            Some(remaining) => {
                queue.close();
                tracing::debug!(
                    key = %self.key,
                    subscriber = id.0,
                    subscribers = remaining,
                    "Subscriber removed"
                );
                true
            }
            None => false,
        }
    }
}

impl<T> Drop for Shared<T> {
    // The last channel handle is gone, nobody can publish any more.
    fn drop(&mut self) {
        for entry in self.subscribers.get_mut().entries.drain(..) {
            entry.queue.close();
        }
    }
}

/// Fan-out channel for one event type
///
/// Cloning is cheap and yields another handle to the same channel.
pub struct BroadcastChannel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for BroadcastChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for BroadcastChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastChannel")
            .field("key", &self.shared.key)
            .field("capacity", &self.shared.capacity)
            .field("subscribers", &self.subscriber_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T: Event> BroadcastChannel<T> {
    /// Create a channel whose subscriber queues hold `capacity` values each.
    ///
    /// A capacity of 0 makes delivery a rendezvous with each subscriber.
    pub fn new(capacity: usize) -> Self {
        Self::with_key(TypeKey::of::<T>(), capacity)
    }

    pub(crate) fn with_key(key: TypeKey, capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                key,
                capacity,
                subscribers: Mutex::new(Subscribers {
                    entries: Vec::new(),
                    closed: false,
                }),
                next_id: AtomicU64::new(0),
                published: AtomicU64::new(0),
                delivered: AtomicU64::new(0),
            }),
        }
    }

    /// Register a new subscriber
    ///
    /// The subscriber only sees values published after this call returns.
    pub fn subscribe(&self) -> Result<Subscription<T>, BusError> {
        let mut subscribers = self.shared.subscribers.lock();
        if subscribers.closed {
            return Err(BusError::Closed(self.shared.key.clone()));
        }

        let id = SubscriberId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let queue = Arc::new(Queue::new(self.shared.capacity));
        subscribers.entries.push(Entry {
            id,
            queue: Arc::clone(&queue),
        });

        tracing::debug!(
            key = %self.shared.key,
            subscriber = id.0,
            subscribers = subscribers.entries.len(),
            capacity = self.shared.capacity,
            "Subscriber added"
        );

        Ok(Subscription::new(id, queue, Arc::downgrade(&self.shared)))
    }

    /// Publish a value to every current subscriber
    ///
    /// Returns the number of subscribers whose queue accepted the value.
    /// With no subscribers this returns immediately. Otherwise each queue
    /// gets a non-blocking attempt first; queues that are full (or waiting
    /// for a rendezvous) are then awaited concurrently, so a slow subscriber
    /// never holds up delivery to the others.
    ///
    /// Dropping the returned future before it completes is not atomic: the
    /// value stays with every subscriber that already accepted it, while
    /// subscribers that were still full never get it. Such a publish is not
    /// counted in [`ChannelStats`].
    pub async fn publish(&self, value: T) -> Result<usize, BusError> {
        let targets: Vec<Arc<Queue<T>>> = {
            let subscribers = self.shared.subscribers.lock();
            if subscribers.closed {
                return Err(BusError::Closed(self.shared.key.clone()));
            }
            subscribers
                .entries
                .iter()
                .map(|entry| Arc::clone(&entry.queue))
                .collect()
        };

        if targets.is_empty() {
            self.shared.published.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %self.shared.key, "Publish without subscribers");
            return Ok(0);
        }

        let mut delivered = 0;
        let mut pending = Vec::new();
        for queue in &targets {
            match queue.try_send(value.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(item)) => pending.push(queue.send(item)),
                Err(TrySendError::Closed(_)) => {}
            }
        }
        drop(value);

        let waited = pending.len();
        if waited > 0 {
            delivered += join_all(pending)
                .await
                .into_iter()
                .filter(Result::is_ok)
                .count();
        }

        self.shared.published.fetch_add(1, Ordering::Relaxed);
        self.shared.delivered.fetch_add(delivered as u64, Ordering::Relaxed);

        tracing::trace!(
            key = %self.shared.key,
            subscribers = targets.len(),
            delivered,
            waited,
            "Published"
        );

        Ok(delivered)
    }
}

impl<T> BroadcastChannel<T> {
    /// Key this channel was created for
    pub fn key(&self) -> &TypeKey {
        &self.shared.key
    }

    /// Per-subscriber queue capacity
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Remove a subscriber and close its queue
    ///
    /// Reads on the subscription then drain what was already buffered and
    /// return `None`. Returns `false` (and does nothing) if the subscription
    /// is not registered with this channel.
    pub fn unsubscribe(&self, subscription: &Subscription<T>) -> bool {
        self.shared.remove(subscription.id(), subscription.queue())
    }

    /// Close the channel
    ///
    /// Every subscriber queue is closed and later `subscribe`/`publish`
    /// calls fail with [`BusError::Closed`]. Closing twice is a no-op that
    /// returns `false`.
    pub fn close(&self) -> bool {
        let entries = {
            let mut subscribers = self.shared.subscribers.lock();
            if subscribers.closed {
                tracing::debug!(key = %self.shared.key, "Channel already closed");
                return false;
            }
            subscribers.closed = true;
            std::mem::take(&mut subscribers.entries)
        };

        for entry in &entries {
            entry.queue.close();
        }

        tracing::info!(
            key = %self.shared.key,
            subscribers = entries.len(),
            "Channel closed"
        );
        true
    }

    /// Whether the channel has been closed
    pub fn is_closed(&self) -> bool {
        self.shared.subscribers.lock().closed
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.lock().entries.len()
    }

    /// Whether two handles refer to the same channel
    pub fn same_channel(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Snapshot of channel statistics
    pub fn stats(&self) -> ChannelStats {
        let (subscribers, closed) = {
            let guard = self.shared.subscribers.lock();
            (guard.entries.len(), guard.closed)
        };

        ChannelStats {
            subscribers,
            capacity: self.shared.capacity,
            published: self.shared.published.load(Ordering::Relaxed),
            delivered: self.shared.delivered.load(Ordering::Relaxed),
            closed,
        }
    }
}
