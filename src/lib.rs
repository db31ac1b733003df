//! In-process typed publish/subscribe bus
//!
//! Producers publish values by type; every subscriber of that type receives
//! each value through its own bounded queue.
//!
//! ```
//! use typebus::Bus;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct UserCreated {
//!     name: String,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), typebus::BusError> {
//! let bus = Bus::new();
//!
//! let mut audit = bus.subscribe::<UserCreated>().await?;
//! let mut mailer = bus.subscribe::<UserCreated>().await?;
//!
//! bus.publish(UserCreated { name: "ada".into() }).await?;
//!
//! assert_eq!(audit.recv().await.unwrap().name, "ada");
//! assert_eq!(mailer.recv().await.unwrap().name, "ada");
//!
//! // Values of other types never show up here
//! bus.publish(42u32).await?;
//! assert!(audit.try_recv().is_err());
//! # Ok(())
//! # }
//! ```
//!
//! The two building blocks are usable on their own:
//!
//! - [`channel`]: [`BroadcastChannel`], the per-type fan-out primitive with
//!   independently paced subscriber queues
//! - [`registry`]: [`Bus`], which owns one channel per type and creates it
//!   on first use

pub mod channel;
pub mod error;
pub mod registry;

pub use channel::{BroadcastChannel, ChannelStats, Event, SubscriberId, Subscription};
pub use error::BusError;
pub use registry::{Bus, BusConfig, ChannelHandle, TypeKey};
