use crate::engine::TransactionProcessor;
use crate::transaction::Transaction;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const DEFAULT_BATCH_INTERVAL: Duration = Duration::from_secs(60);

/// Accumulates transactions for deferred submission.
///
/// Transactions added here are not visible to the engine until a flush,
/// which happens on a configurable cadence once [`start`](Self::start) is
/// called, or immediately via [`process_batch_now`](Self::process_batch_now).
/// Flushing only re-submits through the engine's submission surface; results
/// are never inspected.
pub struct BatchProcessor {
    engine: TransactionProcessor,
    shared: Arc<BatchShared>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

struct BatchShared {
    state: Mutex<BatchState>,
    signal: Condvar,
}

struct BatchState {
    pending: Vec<Transaction>,
    interval: Duration,
    running: bool,
}

impl BatchProcessor {
    pub fn new(engine: TransactionProcessor) -> Self {
        Self {
            engine,
            shared: Arc::new(BatchShared {
                state: Mutex::new(BatchState {
                    pending: Vec::new(),
                    interval: DEFAULT_BATCH_INTERVAL,
                    running: false,
                }),
                signal: Condvar::new(),
            }),
            scheduler: Mutex::new(None),
        }
    }

    /// Spawns the scheduler thread that flushes on the configured interval.
    /// Idempotent.
    pub fn start(&self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if state.running {
                return;
            }
            state.running = true;
        }

        let shared = Arc::clone(&self.shared);
        let engine = self.engine.clone();
        let handle = thread::spawn(move || scheduler_loop(shared, engine));
        *self.scheduler.lock().unwrap() = Some(handle);
    }

    /// Signals the scheduler to exit and joins it. Idempotent. Transactions
    /// still accumulated remain in the batch.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if !state.running {
                return;
            }
            state.running = false;
        }
        self.shared.signal.notify_all();

        if let Some(handle) = self.scheduler.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    pub fn add_to_batch(&self, tx: Transaction) {
        let mut state = self.shared.state.lock().unwrap();
        state.pending.push(tx);
    }

    pub fn batch_size(&self) -> usize {
        self.shared.state.lock().unwrap().pending.len()
    }

    /// Submits every accumulated transaction to the engine and clears the
    /// batch.
    pub fn process_batch_now(&self) {
        let mut state = self.shared.state.lock().unwrap();
        flush(&mut state, &self.engine);
    }

    /// Updates the flush cadence. Applies to waits after the current one.
    pub fn set_auto_batch_interval(&self, interval: Duration) {
        let mut state = self.shared.state.lock().unwrap();
        state.interval = interval;
    }
}

impl Drop for BatchProcessor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn scheduler_loop(shared: Arc<BatchShared>, engine: TransactionProcessor) {
    let mut state = shared.state.lock().unwrap();
    while state.running {
        let interval = state.interval;
        let (guard, timeout) = shared.signal.wait_timeout(state, interval).unwrap();
        state = guard;

        if !state.running {
            break;
        }
        if timeout.timed_out() {
            flush(&mut state, &engine);
        }
    }
}

// Holding the batch lock across submission is safe: submit_transaction only
// touches the engine queue and never reaches back into the accumulator.
fn flush(state: &mut BatchState, engine: &TransactionProcessor) {
    if state.pending.is_empty() {
        return;
    }

    tracing::info!(count = state.pending.len(), "flushing transaction batch");
    for tx in state.pending.drain(..) {
        engine.submit_transaction(tx);
    }
}
