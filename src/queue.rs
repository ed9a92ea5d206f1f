use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// A thread-safe FIFO with a timeout-bounded blocking dequeue.
///
/// Producers never block beyond the mutex; consumers park on the condition
/// variable until an item arrives or the timeout elapses. Successful
/// dequeues observe the FIFO order of enqueues.
pub struct TransactionQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> Default for TransactionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TransactionQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Appends an item and wakes one waiting consumer.
    pub fn enqueue(&self, item: T) {
        let mut items = self.items.lock().unwrap();
        items.push_back(item);
        self.available.notify_one();
    }

    /// Removes and returns the head, waiting up to `timeout` for one to
    /// arrive. Returns `None` when the timeout elapses on an empty queue.
    pub fn dequeue(&self, timeout: Duration) -> Option<T> {
        let items = self.items.lock().unwrap();
        let (mut items, _) = self
            .available
            .wait_timeout_while(items, timeout, |items| items.is_empty())
            .unwrap();
        items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_fifo_order() {
        let queue = TransactionQueue::new();
        queue.enqueue(1);
        queue.enqueue(2);
        queue.enqueue(3);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dequeue(Duration::from_millis(10)), Some(1));
        assert_eq!(queue.dequeue(Duration::from_millis(10)), Some(2));
        assert_eq!(queue.dequeue(Duration::from_millis(10)), Some(3));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dequeue_times_out_when_empty() {
        let queue: TransactionQueue<u32> = TransactionQueue::new();
        let start = Instant::now();
        assert_eq!(queue.dequeue(Duration::from_millis(50)), None);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_enqueue_wakes_blocked_consumer() {
        let queue = Arc::new(TransactionQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.dequeue(Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(20));
        queue.enqueue(42);

        assert_eq!(consumer.join().unwrap(), Some(42));
    }

    #[test]
    fn test_concurrent_consumers_drain_everything() {
        let queue = Arc::new(TransactionQueue::new());
        for i in 0..100 {
            queue.enqueue(i);
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue = Arc::clone(&queue);
            handles.push(thread::spawn(move || {
                let mut drained = Vec::new();
                while let Some(item) = queue.dequeue(Duration::from_millis(50)) {
                    drained.push(item);
                }
                drained
            }));
        }

        let mut all: Vec<i32> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }
}
