//! Bounded, closable delivery queue
//!
//! Each subscriber owns one of these. It behaves like a classic bounded
//! channel with one extra twist: a capacity of zero means rendezvous, i.e.
//! the sender is only released once a receiver has actually taken the value.
//!
//! Internally it is a `VecDeque` behind a `parking_lot::Mutex` plus two
//! `tokio::sync::Notify` instances, one waking receivers and one waking
//! senders. Waiters always register interest (`Notified::enable`) before
//! inspecting state, so a wakeup issued between the check and the await is
//! never lost.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::error::{SendError, TryRecvError, TrySendError};

struct State<T> {
    buffer: VecDeque<T>,
    closed: bool,
    /// Receivers currently parked in `recv`
    waiting: usize,
    /// Total values ever accepted
    enqueued: u64,
    /// Total values ever handed to a receiver
    taken: u64,
}

/// A bounded multi-producer queue that can be closed from either side
pub struct Queue<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    readable: Notify,
    writable: Notify,
}

impl<T> Queue<T> {
    /// Create a queue holding at most `capacity` undelivered values.
    ///
    /// A capacity of 0 makes every `send` a rendezvous with a receiver.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                buffer: VecDeque::with_capacity(capacity.min(64)),
                closed: false,
                waiting: 0,
                enqueued: 0,
                taken: 0,
            }),
            capacity,
            readable: Notify::new(),
            writable: Notify::new(),
        }
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of values buffered and not yet received
    pub fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the queue has been closed
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    // A zero-capacity queue still needs one slot to hand a value over.
    fn slots(&self) -> usize {
        self.capacity.max(1)
    }

    /// Enqueue without waiting.
    ///
    /// With capacity 0 this only succeeds when a receiver is already parked
    /// and waiting for a value.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(TrySendError::Closed(value));
            }

            let accepted = if self.capacity == 0 {
                state.waiting > state.buffer.len()
            } else {
                state.buffer.len() < self.capacity
            };
            if !accepted {
                return Err(TrySendError::Full(value));
            }

            state.buffer.push_back(value);
            state.enqueued += 1;
        }

        self.readable.notify_waiters();
        Ok(())
    }

    /// Enqueue, waiting for free capacity.
    ///
    /// With capacity 0 this also waits until a receiver has taken the value.
    /// If the queue closes while the value sits in the hand-off slot the
    /// value stays readable and the send still counts as accepted.
    ///
    /// Dropping the future before the value is accepted abandons the send.
    pub async fn send(&self, value: T) -> Result<(), SendError<T>> {
        let ticket = loop {
            let notified = self.writable.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if state.closed {
                    return Err(SendError(value));
                }
                if state.buffer.len() < self.slots() {
                    state.buffer.push_back(value);
                    state.enqueued += 1;
                    break state.enqueued;
                }
            }

            notified.await;
        };

        self.readable.notify_waiters();

        if self.capacity > 0 {
            return Ok(());
        }

        loop {
            let notified = self.writable.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.state.lock();
                if state.taken >= ticket || state.closed {
                    return Ok(());
                }
            }

            notified.await;
        }
    }

    /// Dequeue without waiting
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let value = {
            let mut state = self.state.lock();
            match state.buffer.pop_front() {
                Some(value) => {
                    state.taken += 1;
                    value
                }
                None if state.closed => return Err(TryRecvError::Closed),
                None => return Err(TryRecvError::Empty),
            }
        };

        self.writable.notify_waiters();
        Ok(value)
    }

    /// Dequeue, waiting until a value arrives or the queue closes.
    ///
    /// Buffered values are still returned after close; once drained, every
    /// call returns `None` immediately.
    pub async fn recv(&self) -> Option<T> {
        loop {
            let notified = self.readable.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let parked = {
                let mut state = self.state.lock();
                if let Some(value) = state.buffer.pop_front() {
                    state.taken += 1;
                    drop(state);
                    self.writable.notify_waiters();
                    return Some(value);
                }
                if state.closed {
                    return None;
                }
                state.waiting += 1;
                Parked(self)
            };

            notified.await;
            drop(parked);
        }
    }

    /// Close the queue, waking every parked sender and receiver.
    ///
    /// Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        {
            let mut state = self.state.lock();
            if state.closed {
                return false;
            }
            state.closed = true;
        }

        self.readable.notify_waiters();
        self.writable.notify_waiters();
        true
    }
}

/// Keeps the parked-receiver count right even if `recv` is cancelled
struct Parked<'a, T>(&'a Queue<T>);

impl<T> Drop for Parked<'_, T> {
    fn drop(&mut self) {
        self.0.state.lock().waiting -= 1;
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::task;
    use tokio_test::{assert_pending, assert_ready, assert_ready_eq, assert_ready_ok};

    use super::*;

    #[test]
    fn test_buffered_send_does_not_block_until_full() {
        let queue = Queue::new(2);

        queue.try_send(1).unwrap();
        queue.try_send(2).unwrap();
        assert_eq!(queue.len(), 2);
        let err = queue.try_send(3).unwrap_err();
        assert!(!err.is_closed());
        assert_eq!(err.into_inner(), 3);

        // The third send parks until a read frees a slot
        let mut send = task::spawn(queue.send(3));
        assert_pending!(send.poll());

        assert_eq!(queue.try_recv(), Ok(1));
        assert!(send.is_woken());
        assert_ready_ok!(send.poll());

        assert_eq!(queue.try_recv(), Ok(2));
        assert_eq!(queue.try_recv(), Ok(3));
        assert_eq!(queue.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_zero_capacity_send_is_rendezvous() {
        let queue = Queue::new(0);

        // Nobody is waiting, so a non-blocking send cannot hand off
        assert!(matches!(queue.try_send(7), Err(TrySendError::Full(7))));

        let mut send = task::spawn(queue.send(7));
        assert_pending!(send.poll());

        // Value is parked in the hand-off slot, sender still waits
        assert_eq!(queue.len(), 1);
        assert_pending!(send.poll());

        assert_eq!(queue.try_recv(), Ok(7));
        assert!(send.is_woken());
        assert_ready_ok!(send.poll());
    }

    #[test]
    fn test_zero_capacity_try_send_hands_off_to_parked_receiver() {
        let queue = Queue::new(0);

        let mut recv = task::spawn(queue.recv());
        assert_pending!(recv.poll());

        queue.try_send(5).unwrap();
        assert!(recv.is_woken());
        assert_ready_eq!(recv.poll(), Some(5));

        // Receiver is gone again, so hand-off is no longer possible
        assert!(matches!(queue.try_send(6), Err(TrySendError::Full(6))));
    }

    #[test]
    fn test_cancelled_recv_releases_parked_slot() {
        let queue = Queue::<u32>::new(0);

        let mut recv = task::spawn(queue.recv());
        assert_pending!(recv.poll());
        drop(recv);

        assert!(matches!(queue.try_send(1), Err(TrySendError::Full(1))));
    }

    #[test]
    fn test_close_wakes_pending_receiver() {
        let queue = Queue::<u32>::new(0);

        let mut recv = task::spawn(queue.recv());
        assert_pending!(recv.poll());

        assert!(queue.close());
        assert!(recv.is_woken());
        assert_ready_eq!(recv.poll(), None);
    }

    #[test]
    fn test_closed_queue_drains_then_yields_none_forever() {
        let queue = Queue::new(4);
        queue.try_send(1).unwrap();
        queue.try_send(2).unwrap();

        assert!(queue.close());
        assert!(!queue.close());

        let mut first = task::spawn(queue.recv());
        assert_ready_eq!(first.poll(), Some(1));
        let mut second = task::spawn(queue.recv());
        assert_ready_eq!(second.poll(), Some(2));

        for _ in 0..3 {
            let mut read = task::spawn(queue.recv());
            assert_ready_eq!(read.poll(), None);
        }
        assert_eq!(queue.try_recv(), Err(TryRecvError::Closed));
    }

    #[test]
    fn test_close_releases_blocked_sender() {
        let queue = Queue::new(1);
        queue.try_send(1).unwrap();

        let mut send = task::spawn(queue.send(2));
        assert_pending!(send.poll());

        queue.close();
        assert!(send.is_woken());
        let err = assert_ready!(send.poll()).unwrap_err();
        assert_eq!(err.into_inner(), 2);
    }

    #[test]
    fn test_send_to_closed_queue_fails() {
        let queue = Queue::new(1);
        queue.close();

        let err = queue.try_send(1).unwrap_err();
        assert!(err.is_closed());
        assert_eq!(err.into_inner(), 1);
        let mut send = task::spawn(queue.send(2));
        assert!(assert_ready!(send.poll()).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_producers_preserve_per_producer_order() {
        use std::sync::Arc;

        let queue = Arc::new(Queue::new(0));

        let producers: Vec<_> = (0..2u32)
            .map(|p| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move {
                    for i in 0..50u32 {
                        queue.send((p, i)).await.unwrap();
                    }
                })
            })
            .collect();

        let mut last = [None::<u32>; 2];
        for _ in 0..100 {
            let (p, i) = queue.recv().await.unwrap();
            if let Some(prev) = last[p as usize] {
                assert!(i > prev);
            }
            last[p as usize] = Some(i);
        }

        for producer in producers {
            producer.await.unwrap();
        }
        assert!(queue.is_empty());
    }
}
