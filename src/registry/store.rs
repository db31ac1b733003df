//! Typed channel registry
//!
//! The [`Bus`] maps each event type to exactly one broadcast channel,
//! created on first use and shared by every caller of that type.

use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::config::BusConfig;
use super::entry::ChannelHandle;
use super::key::TypeKey;
use crate::channel::{BroadcastChannel, Event, Subscription};
use crate::error::BusError;

/// Registry of broadcast channels keyed by event type
///
/// Thread-safe via `RwLock`. Lookups of existing channels only take the read
/// lock; the write lock is held just long enough to insert a new channel.
/// Cloning is cheap and every clone shares the same channels.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

struct Inner {
    /// Map of type key to channel
    channels: RwLock<HashMap<TypeKey, ChannelHandle>>,

    /// Configuration
    config: BusConfig,
}

impl Bus {
    /// Create a new, empty bus with default configuration
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Create a new, empty bus with custom configuration
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                channels: RwLock::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Get the bus configuration
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Look up the channel bound to `key`
    pub async fn get(&self, key: &TypeKey) -> Option<ChannelHandle> {
        self.inner.channels.read().await.get(key).cloned()
    }

    /// Bind `handle` to `key` if the key is still free
    ///
    /// Entries are never overwritten: if the key is taken this fails with
    /// [`BusError::ChannelAlreadyExists`] and the caller should use the
    /// existing channel from [`get`](Self::get) instead.
    pub async fn set(&self, key: TypeKey, handle: ChannelHandle) -> Result<(), BusError> {
        let mut channels = self.inner.channels.write().await;

        if channels.contains_key(&key) {
            return Err(BusError::ChannelAlreadyExists(key));
        }

        tracing::info!(
            key = %key,
            element_type = handle.element_type(),
            "Channel registered"
        );
        channels.insert(key, handle);
        Ok(())
    }

    /// Get the channel for `T`, creating it if this is the first use
    ///
    /// Creation happens in a single critical section, so concurrent first
    /// callers all end up with the same channel and no spare channel is
    /// ever built.
    pub async fn channel<T: Event>(&self) -> Result<BroadcastChannel<T>, BusError> {
        let key = TypeKey::of::<T>();

        if let Some(handle) = self.get(&key).await {
            return narrow(&key, &handle);
        }

        let mut channels = self.inner.channels.write().await;
        let handle = channels.entry(key.clone()).or_insert_with(|| {
            tracing::info!(
                key = %key,
                capacity = self.inner.config.subscriber_capacity,
                "Channel created"
            );
            ChannelHandle::new(BroadcastChannel::<T>::with_key(
                key.clone(),
                self.inner.config.subscriber_capacity,
            ))
        });

        narrow(&key, handle)
    }

    /// Subscribe to values of type `T`
    pub async fn subscribe<T: Event>(&self) -> Result<Subscription<T>, BusError> {
        self.channel::<T>().await?.subscribe()
    }

    /// Publish a value to every subscriber of its type
    ///
    /// Returns immediately when `T` has no subscribers. Dropping the future
    /// early can leave the value with only some subscribers, see
    /// [`BroadcastChannel::publish`].
    pub async fn publish<T: Event>(&self, value: T) -> Result<(), BusError> {
        self.channel::<T>().await?.publish(value).await?;
        Ok(())
    }

    /// Whether a channel for `T` exists
    pub async fn contains<T: Event>(&self) -> bool {
        self.inner.channels.read().await.contains_key(&TypeKey::of::<T>())
    }

    /// Close the channel for `T`
    ///
    /// Returns `Ok(false)` if there is no such channel or it was already
    /// closed. The entry stays bound, so later use of `T` fails with
    /// [`BusError::Closed`].
    pub async fn close<T: Event>(&self) -> Result<bool, BusError> {
        let key = TypeKey::of::<T>();
        match self.get(&key).await {
            Some(handle) => Ok(narrow::<T>(&key, &handle)?.close()),
            None => Ok(false),
        }
    }

    /// Close every channel, returning how many were open
    pub async fn close_all(&self) -> usize {
        let handles: Vec<ChannelHandle> =
            self.inner.channels.read().await.values().cloned().collect();
        let closed = handles.iter().filter(|handle| handle.close()).count();

        tracing::info!(channels = handles.len(), closed, "Bus closed");
        closed
    }

    /// Get total number of channels
    pub async fn channel_count(&self) -> usize {
        self.inner.channels.read().await.len()
    }

    /// Keys of all channels, sorted
    pub async fn keys(&self) -> Vec<TypeKey> {
        let mut keys: Vec<TypeKey> = self.inner.channels.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

fn narrow<T: Event>(
    key: &TypeKey,
    handle: &ChannelHandle,
) -> Result<BroadcastChannel<T>, BusError> {
    handle.downcast::<T>().ok_or_else(|| {
        tracing::warn!(
            key = %key,
            expected = type_name::<T>(),
            found = handle.element_type(),
            "Channel type mismatch"
        );
        BusError::InvalidChannelType {
            key: key.clone(),
            expected: type_name::<T>(),
            found: handle.element_type(),
        }
    })
}
