//! Fixed-capacity overwrite queue shared between one producer and one consumer.

use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Deque;

/// Bounded FIFO that drops the oldest entry instead of rejecting a new one.
///
/// Every mutation runs inside a critical section, so a queue placed in a
/// `static` can be fed from an interrupt handler and drained from thread mode.
/// Nothing here blocks beyond the critical section itself.
///
/// # Example
///
/// ```
/// use rc_core::BoundedQueue;
///
/// let queue: BoundedQueue<u8, 2> = BoundedQueue::new();
/// queue.push_overwrite(1);
/// queue.push_overwrite(2);
/// queue.push_overwrite(3); // drops 1
///
/// assert_eq!(queue.pop(), Some(2));
/// assert_eq!(queue.pop(), Some(3));
/// assert_eq!(queue.pop(), None);
/// ```
pub struct BoundedQueue<T, const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Deque<T, N>>>,
}

impl<T, const N: usize> BoundedQueue<T, N> {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Maximum number of elements held.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count() == N
    }

    /// Number of elements currently queued.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.lock(|q| q.borrow().len())
    }

    /// Append an element, dropping the oldest one if the queue is full.
    ///
    /// Never fails and never blocks the producer.
    pub fn push_overwrite(&self, item: T) {
        self.inner.lock(|q| {
            let mut q = q.borrow_mut();
            if q.is_full() {
                q.pop_front();
                trace!("queue full, dropped oldest entry");
            }
            // Room was made above, so this cannot be rejected.
            let _ = q.push_back(item);
        });
    }

    /// Remove and return the oldest element.
    pub fn pop(&self) -> Option<T> {
        self.inner.lock(|q| q.borrow_mut().pop_front())
    }

    /// Drop every queued element.
    pub fn clear(&self) {
        self.inner.lock(|q| q.borrow_mut().clear());
    }
}

impl<T, const N: usize> Default for BoundedQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::{RcMessage, MESSAGE_QUEUE_DEPTH};

    fn message(value: u16) -> RcMessage {
        let mut msg = RcMessage::new();
        msg.channels = [value; crate::RC_NUM_CHANNELS];
        msg
    }

    #[test]
    fn test_new_queue_is_empty() {
        let queue: BoundedQueue<u32, 4> = BoundedQueue::new();
        assert!(queue.is_empty());
        assert!(!queue.is_full());
        assert_eq!(queue.count(), 0);
        assert_eq!(queue.capacity(), 4);
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_fifo_order() {
        let queue: BoundedQueue<u32, 4> = BoundedQueue::new();
        queue.push_overwrite(10);
        queue.push_overwrite(20);
        queue.push_overwrite(30);

        assert_eq!(queue.count(), 3);
        assert_eq!(queue.pop(), Some(10));
        assert_eq!(queue.pop(), Some(20));
        assert_eq!(queue.pop(), Some(30));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_at_capacity() {
        let queue: BoundedQueue<u32, 3> = BoundedQueue::new();
        for i in 0..3 {
            queue.push_overwrite(i);
        }
        assert!(queue.is_full());
        assert_eq!(queue.count(), 3);
    }

    #[test]
    fn test_overwrite_drops_oldest_message() {
        let queue: BoundedQueue<RcMessage, MESSAGE_QUEUE_DEPTH> = BoundedQueue::new();

        for i in 1..=17u16 {
            queue.push_overwrite(message(i));
        }

        assert_eq!(queue.count(), 16);
        assert!(queue.is_full());

        for i in 2..=17u16 {
            assert_eq!(queue.pop(), Some(message(i)));
        }
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_wraparound_after_partial_drain() {
        let queue: BoundedQueue<u32, 3> = BoundedQueue::new();
        queue.push_overwrite(1);
        queue.push_overwrite(2);
        assert_eq!(queue.pop(), Some(1));

        queue.push_overwrite(3);
        queue.push_overwrite(4);
        queue.push_overwrite(5); // drops 2

        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), Some(4));
        assert_eq!(queue.pop(), Some(5));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_clear() {
        let queue: BoundedQueue<u32, 4> = BoundedQueue::new();
        queue.push_overwrite(1);
        queue.push_overwrite(2);
        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);

        queue.push_overwrite(7);
        assert_eq!(queue.pop(), Some(7));
    }

    #[test]
    fn test_shared_between_threads() {
        use std::sync::Arc;
        use std::thread;

        let queue: Arc<BoundedQueue<u32, 8>> = Arc::new(BoundedQueue::new());
        let producer = {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..1000 {
                    queue.push_overwrite(i);
                }
            })
        };

        let mut last = None;
        let mut popped = 0;
        while popped < 100 {
            if let Some(v) = queue.pop() {
                // Values only ever move forward, even when entries are dropped.
                if let Some(prev) = last {
                    assert!(v > prev);
                }
                last = Some(v);
                popped += 1;
            }
            if producer.is_finished() && queue.is_empty() {
                break;
            }
        }

        producer.join().unwrap();
        assert!(queue.count() <= 8);
    }
}
