use crate::catalog::column::ColumnKey;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

#[derive(Default)]
struct QueueState {
    items: VecDeque<ColumnKey>,
    pending: HashSet<ColumnKey>,
    closed: bool,
}

/// FIFO of columns awaiting a statistics pass. A key already pending is not
/// re-added, so discovery passes and staleness rescans never duplicate work.
/// Supports concurrent enqueue and a single consumer with a bounded-wait pop.
#[derive(Default)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    cv: Condvar,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a key unless it is already pending or the queue is closed.
    /// Returns whether the key was added.
    pub fn push(&self, key: ColumnKey) -> bool {
        let mut state = self.state.lock();
        if state.closed || !state.pending.insert(key.clone()) {
            return false;
        }
        state.items.push_back(key);
        self.cv.notify_one();
        true
    }

    /// Enqueues each key, skipping duplicates. Returns how many were added.
    pub fn extend(&self, keys: impl IntoIterator<Item = ColumnKey>) -> usize {
        let mut state = self.state.lock();
        if state.closed {
            return 0;
        }
        let mut added = 0;
        for key in keys {
            if state.pending.insert(key.clone()) {
                state.items.push_back(key);
                added += 1;
            }
        }
        if added > 0 {
            self.cv.notify_one();
        }
        added
    }

    /// Pops the next key, waiting up to `timeout` for one to arrive. Returns
    /// `None` on timeout or once the queue is closed and drained.
    pub fn pop(&self, timeout: Duration) -> Option<ColumnKey> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(key) = state.items.pop_front() {
                state.pending.remove(&key);
                return Some(key);
            }
            if state.closed || Instant::now() >= deadline {
                return None;
            }
            self.cv.wait_until(&mut state, deadline);
        }
    }

    /// Wakes the consumer and makes all subsequent pops on an empty queue
    /// return immediately.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.cv.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::WorkQueue;
    use crate::catalog::column::ColumnKey;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn key(table: &str, abs_name: &str) -> ColumnKey {
        ColumnKey {
            table: table.into(),
            abs_name: abs_name.into(),
        }
    }

    #[test]
    fn pop_returns_in_fifo_order() {
        let queue = WorkQueue::new();
        assert!(queue.push(key("t", "a")));
        assert!(queue.push(key("t", "b")));
        assert_eq!(queue.pop(Duration::from_millis(1)), Some(key("t", "a")));
        assert_eq!(queue.pop(Duration::from_millis(1)), Some(key("t", "b")));
        assert_eq!(queue.pop(Duration::from_millis(1)), None);
    }

    #[test]
    fn pending_keys_are_not_duplicated() {
        let queue = WorkQueue::new();
        assert!(queue.push(key("t", "a")));
        assert!(!queue.push(key("t", "a")));
        assert_eq!(queue.extend(vec![key("t", "a"), key("t", "b")]), 1);
        assert_eq!(queue.len(), 2);

        // Once popped, the same key may be enqueued again.
        assert_eq!(queue.pop(Duration::from_millis(1)), Some(key("t", "a")));
        assert!(queue.push(key("t", "a")));
    }

    #[test]
    fn pop_times_out_when_empty() {
        let queue = WorkQueue::new();
        let started = Instant::now();
        assert_eq!(queue.pop(Duration::from_millis(20)), None);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn pop_wakes_on_concurrent_push() {
        let queue = Arc::new(WorkQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop(Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(10));
        queue.push(key("t", "a"));
        assert_eq!(consumer.join().expect("consumer"), Some(key("t", "a")));
    }

    #[test]
    fn close_drains_then_rejects() {
        let queue = Arc::new(WorkQueue::new());
        queue.push(key("t", "a"));
        queue.close();
        assert_eq!(queue.pop(Duration::from_secs(5)), Some(key("t", "a")));
        let started = Instant::now();
        assert_eq!(queue.pop(Duration::from_secs(5)), None);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!queue.push(key("t", "b")));
    }
}
