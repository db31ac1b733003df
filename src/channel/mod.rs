//! Broadcast channels
//!
//! A [`BroadcastChannel`] delivers every published value to each of its
//! subscribers through a dedicated bounded queue:
//!
//! ```text
//!                     BroadcastChannel<T>
//!               ┌───────────────────────────┐
//!  publish(v) ──►  subscribers: [           │
//!               │    #0 Queue<T> (cap b) ───┼──► Subscription #0 .recv()
//!               │    #1 Queue<T> (cap b) ───┼──► Subscription #1 .recv()
//!               │    #2 Queue<T> (cap b) ───┼──► Subscription #2 .recv()
//!               │  ]                        │
//!               └───────────────────────────┘
//! ```
//!
//! Unlike `tokio::sync::broadcast`, nothing is ever dropped for a lagging
//! subscriber: a full queue makes the publisher wait for that subscriber
//! only, while the others are served straight away. A capacity of zero turns
//! each delivery into a rendezvous.

pub mod broadcast;
pub mod error;
pub mod queue;
pub mod subscription;

pub use broadcast::{BroadcastChannel, ChannelStats, Event, SubscriberId};
pub use error::{SendError, TryRecvError, TrySendError};
pub use queue::Queue;
pub use subscription::Subscription;
