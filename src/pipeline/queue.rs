//! Bounded drop-oldest hand-off queue between producers and the worker
//!
//! Producers never block: when the queue is full the oldest queued item is
//! discarded to make room. The consumer blocks until an item arrives or the
//! queue is closed.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Result of a [`DropOldestQueue::push`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Queued without loss
    Accepted,
    /// Queued after discarding the oldest queued item
    DroppedOldest,
    /// Queue closed; the item was discarded
    Closed,
}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
    /// Consumer holds an item it has not finished with
    busy: bool,
}

/// Multi-producer, single-consumer bounded queue
#[derive(Debug)]
pub struct DropOldestQueue<T> {
    capacity: usize,
    state: Mutex<QueueState<T>>,
    available: Condvar,
    idle: Condvar,
}

impl<T> DropOldestQueue<T> {
    /// Create a queue holding at most `capacity` items (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.min(1024)),
                closed: false,
                busy: false,
            }),
            available: Condvar::new(),
            idle: Condvar::new(),
        }
    }

    /// Maximum number of queued items
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enqueue without blocking
    pub fn push(&self, item: T) -> PushOutcome {
        let mut state = self.state.lock();
        if state.closed {
            return PushOutcome::Closed;
        }
        let outcome = if state.items.len() >= self.capacity {
            state.items.pop_front();
            PushOutcome::DroppedOldest
        } else {
            PushOutcome::Accepted
        };
        state.items.push_back(item);
        drop(state);
        self.available.notify_one();
        outcome
    }

    /// Take the next item, blocking while the queue is empty and open
    ///
    /// Returns `None` once the queue is closed and empty. Each returned item
    /// must be acknowledged with [`task_done`](Self::task_done).
    pub fn pop_blocking(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                state.busy = true;
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Acknowledge the item last returned by [`pop_blocking`](Self::pop_blocking)
    pub fn task_done(&self) {
        let mut state = self.state.lock();
        state.busy = false;
        if state.items.is_empty() {
            self.idle.notify_all();
        }
    }

    /// Close the queue
    ///
    /// With `drain` the consumer still receives what is queued; without it
    /// the backlog is discarded. Returns the number of discarded items.
    pub fn close(&self, drain: bool) -> usize {
        let mut state = self.state.lock();
        state.closed = true;
        let discarded = if drain {
            0
        } else {
            let n = state.items.len();
            state.items.clear();
            n
        };
        if state.items.is_empty() && !state.busy {
            self.idle.notify_all();
        }
        drop(state);
        self.available.notify_all();
        discarded
    }

    /// Wait until nothing is queued or in progress; `false` on timeout
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.items.is_empty() || state.busy {
            if self.idle.wait_until(&mut state, deadline).timed_out() {
                return state.items.is_empty() && !state.busy;
            }
        }
        true
    }

    /// Items currently queued
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fifo_order() {
        let queue = DropOldestQueue::new(4);
        for i in 0..3 {
            assert_eq!(queue.push(i), PushOutcome::Accepted);
        }
        assert_eq!(queue.pop_blocking(), Some(0));
        queue.task_done();
        assert_eq!(queue.pop_blocking(), Some(1));
        queue.task_done();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let queue = DropOldestQueue::new(2);
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.push(3), PushOutcome::DroppedOldest);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop_blocking(), Some(2));
        queue.task_done();
        assert_eq!(queue.pop_blocking(), Some(3));
        queue.task_done();
    }

    #[test]
    fn test_close_with_drain_keeps_backlog() {
        let queue = DropOldestQueue::new(4);
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.close(true), 0);
        assert_eq!(queue.push("c"), PushOutcome::Closed);
        assert_eq!(queue.pop_blocking(), Some("a"));
        queue.task_done();
        assert_eq!(queue.pop_blocking(), Some("b"));
        queue.task_done();
        assert_eq!(queue.pop_blocking(), None);
    }

    #[test]
    fn test_close_without_drain_discards() {
        let queue = DropOldestQueue::new(4);
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.close(false), 2);
        assert_eq!(queue.pop_blocking(), None);
        assert!(queue.is_closed());
    }

    #[test]
    fn test_close_wakes_blocked_consumer() {
        let queue = Arc::new(DropOldestQueue::<u32>::new(1));
        let consumer = {
            let queue = queue.clone();
            std::thread::spawn(move || queue.pop_blocking())
        };
        std::thread::sleep(Duration::from_millis(20));
        queue.close(true);
        assert_eq!(consumer.join().unwrap(), None);
    }

    #[test]
    fn test_wait_idle() {
        let queue = Arc::new(DropOldestQueue::new(8));
        assert!(queue.wait_idle(Duration::from_millis(1)));

        queue.push(1);
        assert!(!queue.wait_idle(Duration::from_millis(10)));

        let consumer = {
            let queue = queue.clone();
            std::thread::spawn(move || {
                while queue.pop_blocking().is_some() {
                    queue.task_done();
                }
            })
        };
        assert!(queue.wait_idle(Duration::from_secs(5)));
        queue.close(true);
        consumer.join().unwrap();
    }
}
