//! Subscriber handle
//!
//! A [`Subscription`] is the read side of one subscriber queue. Dropping it
//! unsubscribes.

use std::fmt;
use std::sync::{Arc, Weak};

use futures::stream::{self, Stream};

use super::broadcast::{Shared, SubscriberId};
use super::error::TryRecvError;
use super::queue::Queue;

/// Read-only handle to a subscriber's delivery queue
pub struct Subscription<T> {
    id: SubscriberId,
    queue: Arc<Queue<T>>,
    channel: Weak<Shared<T>>,
}

impl<T> Subscription<T> {
    pub(super) fn new(id: SubscriberId, queue: Arc<Queue<T>>, channel: Weak<Shared<T>>) -> Self {
        Self { id, queue, channel }
    }

    pub(super) fn queue(&self) -> &Arc<Queue<T>> {
        &self.queue
    }

    /// Identity of this subscription within its channel
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Receive the next value
    ///
    /// Waits until a value is published or the subscription is closed (by
    /// unsubscribing or closing the channel). Values buffered before the
    /// close are still delivered; after that every call returns `None`
    /// without waiting.
    pub async fn recv(&mut self) -> Option<T> {
        self.queue.recv().await
    }

    /// Like [`recv`](Self::recv), but a closed subscription yields
    /// `T::default()`
    pub async fn recv_or_default(&mut self) -> T
    where
        T: Default,
    {
        self.recv().await.unwrap_or_default()
    }

    /// Receive a value if one is buffered
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.queue.try_recv()
    }

    /// Number of values waiting to be read
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no values are waiting
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue capacity fixed at subscribe time
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Whether delivery to this subscription has stopped
    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    /// Stop receiving values
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Turn the subscription into a `Stream` that ends when it is closed
    pub fn into_stream(self) -> impl Stream<Item = T>
    where
        T: Send + 'static,
    {
        stream::unfold(self, |mut subscription| async move {
            let value = subscription.recv().await?;
            Some((value, subscription))
        })
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.remove(self.id, &self.queue);
        }
        self.queue.close();
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("capacity", &self.queue.capacity())
            .field("buffered", &self.queue.len())
            .field("closed", &self.queue.is_closed())
            .finish()
    }
}
