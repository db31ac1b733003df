//! Bus error types
//!
//! Error type for registry and broadcast channel operations.

use crate::registry::TypeKey;

/// Error type for bus operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The channel bound to a key carries a different element type
    InvalidChannelType {
        key: TypeKey,
        expected: &'static str,
        found: &'static str,
    },
    /// A channel is already bound to this key
    ChannelAlreadyExists(TypeKey),
    /// The channel has been closed
    Closed(TypeKey),
}

impl BusError {
    /// Key of the channel the error refers to
    pub fn key(&self) -> &TypeKey {
        match self {
            BusError::InvalidChannelType { key, .. } => key,
            BusError::ChannelAlreadyExists(key) => key,
            BusError::Closed(key) => key,
        }
    }
}

impl std::fmt::Display for BusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusError::InvalidChannelType {
                key,
                expected,
                found,
            } => write!(
                f,
                "Invalid channel type for {}: expected {}, found {}",
                key, expected, found
            ),
            BusError::ChannelAlreadyExists(key) => write!(f, "Channel already exists: {}", key),
            BusError::Closed(key) => write!(f, "Channel closed: {}", key),
        }
    }
}

impl std::error::Error for BusError {}
