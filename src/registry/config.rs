//! Registry configuration

/// Queue capacity given to subscribers of channels the registry creates
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 100;

/// Configuration for a [`Bus`](super::Bus)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Per-subscriber queue capacity for newly created channels
    ///
    /// 0 makes every delivery a rendezvous with the subscriber.
    pub subscriber_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
        }
    }
}

impl BusConfig {
    /// Set the per-subscriber queue capacity
    pub fn subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity;
        self
    }

    /// Use rendezvous delivery for every channel
    pub fn rendezvous(self) -> Self {
        self.subscriber_capacity(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        assert_eq!(
            BusConfig::default().subscriber_capacity,
            DEFAULT_SUBSCRIBER_CAPACITY
        );
        assert_eq!(
            BusConfig::default()
                .subscriber_capacity(8)
                .subscriber_capacity,
            8
        );
        assert_eq!(BusConfig::default().rendezvous().subscriber_capacity, 0);
    }
}
