//! Subscriber queue error types

use std::fmt;

/// Returned by [`Queue::send`](super::queue::Queue::send) when the queue was
/// closed before it accepted the value. Carries the value back to the caller.
pub struct SendError<T>(pub T);

impl<T> SendError<T> {
    /// Recover the value that could not be sent
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendError").finish_non_exhaustive()
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscriber queue closed")
    }
}

impl<T> std::error::Error for SendError<T> {}

/// Error returned by a non-blocking enqueue
pub enum TrySendError<T> {
    /// The queue has no free capacity (or, with capacity 0, no parked receiver)
    Full(T),
    /// The queue is closed
    Closed(T),
}

impl<T> TrySendError<T> {
    /// Recover the value that could not be sent
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(value) | TrySendError::Closed(value) => value,
        }
    }

    /// Whether the failure was caused by a closed queue
    pub fn is_closed(&self) -> bool {
        matches!(self, TrySendError::Closed(_))
    }
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => write!(f, "Full(..)"),
            TrySendError::Closed(_) => write!(f, "Closed(..)"),
        }
    }
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => write!(f, "Subscriber queue full"),
            TrySendError::Closed(_) => write!(f, "Subscriber queue closed"),
        }
    }
}

impl<T> std::error::Error for TrySendError<T> {}

/// Error returned by a non-blocking dequeue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// Nothing buffered right now
    Empty,
    /// The queue is closed and drained
    Closed,
}

impl fmt::Display for TryRecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryRecvError::Empty => write!(f, "Subscriber queue empty"),
            TryRecvError::Closed => write!(f, "Subscriber queue closed"),
        }
    }
}

impl std::error::Error for TryRecvError {}
