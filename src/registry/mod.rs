//! Typed channel registry
//!
//! The registry maps each event type to a single broadcast channel. Channels
//! are created lazily on the first `subscribe` or `publish` of a type and are
//! never replaced afterwards.
//!
//! # Architecture
//!
//! ```text
//!                     Bus (clones share one Arc)
//!                 ┌──────────────────────────────────┐
//!                 │ channels: HashMap<TypeKey,       │
//!                 │   ChannelHandle(                 │
//!                 │     Arc<dyn ErasedChannel>       │
//!                 │   )                              │
//!                 │ >                                │
//!                 └────────────────┬─────────────────┘
//!                                  │ downcast::<T>()
//!          ┌───────────────────────┼───────────────────────┐
//!          ▼                       ▼                       ▼
//!   BroadcastChannel<i32>  BroadcastChannel<String>  BroadcastChannel<Order>
//! ```
//!
//! Keys come from [`TypeKey::of`]. Because the element type is erased in the
//! map, every lookup narrows the handle back with a checked downcast and
//! reports [`BusError::InvalidChannelType`](crate::BusError::InvalidChannelType)
//! if the bound channel carries a different type.

pub mod config;
pub mod entry;
pub mod key;
pub mod store;

pub use config::{BusConfig, DEFAULT_SUBSCRIBER_CAPACITY};
pub use entry::{ChannelHandle, ErasedChannel};
pub use key::TypeKey;
pub use store::Bus;
