//! Type-erased channel handles
//!
//! The registry holds channels of many element types in one map. Each is
//! stored behind the sealed [`ErasedChannel`] trait and narrowed back to
//! `BroadcastChannel<T>` with a checked downcast.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::channel::{BroadcastChannel, Event};

use super::key::TypeKey;

mod sealed {
    pub trait Sealed {}
}

/// Operations the registry can perform without knowing the element type
pub trait ErasedChannel: sealed::Sealed + Send + Sync + 'static {
    /// Access for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Key the channel was created for
    fn key(&self) -> &TypeKey;

    /// Name of the element type
    fn element_type(&self) -> &'static str;

    /// Number of registered subscribers
    fn subscriber_count(&self) -> usize;

    /// Whether the channel has been closed
    fn is_closed(&self) -> bool;

    /// Close the channel, returning `false` if it was already closed
    fn close(&self) -> bool;
}

impl<T: Event> sealed::Sealed for BroadcastChannel<T> {}

impl<T: Event> ErasedChannel for BroadcastChannel<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn key(&self) -> &TypeKey {
        BroadcastChannel::key(self)
    }

    fn element_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn subscriber_count(&self) -> usize {
        BroadcastChannel::subscriber_count(self)
    }

    fn is_closed(&self) -> bool {
        BroadcastChannel::is_closed(self)
    }

    fn close(&self) -> bool {
        BroadcastChannel::close(self)
    }
}

/// Cloneable, untyped handle to a broadcast channel
#[derive(Clone)]
pub struct ChannelHandle(Arc<dyn ErasedChannel>);

impl ChannelHandle {
    /// Wrap a typed channel
    pub fn new<T: Event>(channel: BroadcastChannel<T>) -> Self {
        Self(Arc::new(channel))
    }

    /// Narrow back to the typed channel, `None` if `T` is not its element type
    pub fn downcast<T: Event>(&self) -> Option<BroadcastChannel<T>> {
        self.0
            .as_any()
            .downcast_ref::<BroadcastChannel<T>>()
            .cloned()
    }

    /// Key the channel was created for
    pub fn key(&self) -> &TypeKey {
        self.0.key()
    }

    /// Name of the element type
    pub fn element_type(&self) -> &'static str {
        self.0.element_type()
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.0.subscriber_count()
    }

    /// Whether the channel has been closed
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    /// Close the channel
    pub fn close(&self) -> bool {
        self.0.close()
    }
}

impl<T: Event> From<BroadcastChannel<T>> for ChannelHandle {
    fn from(channel: BroadcastChannel<T>) -> Self {
        Self::new(channel)
    }
}

impl fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("key", self.key())
            .field("element_type", &self.element_type())
            .field("subscribers", &self.subscriber_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
