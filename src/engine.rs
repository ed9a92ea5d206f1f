use crate::queue::TransactionQueue;
use crate::router::{TransactionRouter, DEFAULT_PROCESSOR_ID};
use crate::transaction::{Transaction, TransactionStatus};
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long a worker parks on the pending queue before re-checking the
/// running flag. Bounds the shutdown latency of an idle worker.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const DEFAULT_WORKER_COUNT: usize = 4;

/// A processor advances a transaction from `Processing` to a terminal
/// status, filling in the response envelope.
///
/// Implemented for free by any `Fn(&mut Transaction)` closure or function.
/// Handlers run on worker threads with no engine lock held, so they may
/// block for as long as they need.
pub trait ProcessorHandler: Send + Sync {
    fn process(&self, tx: &mut Transaction);
}

impl<F> ProcessorHandler for F
where
    F: Fn(&mut Transaction) + Send + Sync,
{
    fn process(&self, tx: &mut Transaction) {
        self(tx)
    }
}

/// The transaction execution engine: a registry of processors and a pool of
/// worker threads draining a shared pending queue.
///
/// Cloning is cheap and yields a handle to the same engine. Construction
/// registers illustrative `default-processor`, `visa-processor`, and
/// `mastercard-processor` handlers; real deployments replace them via
/// [`register_processor`](Self::register_processor). No routes are
/// registered at construction.
#[derive(Clone)]
pub struct TransactionProcessor {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    pending: TransactionQueue<Transaction>,
    router: TransactionRouter,
    processors: Mutex<HashMap<String, Arc<dyn ProcessorHandler>>>,
    results: Mutex<HashMap<String, Transaction>>,
    running: AtomicBool,
    worker_count: usize,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for TransactionProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_COUNT)
    }
}

impl TransactionProcessor {
    pub fn new(worker_count: usize) -> Self {
        let processor = Self {
            inner: Arc::new(EngineInner {
                pending: TransactionQueue::new(),
                router: TransactionRouter::new(),
                processors: Mutex::new(HashMap::new()),
                results: Mutex::new(HashMap::new()),
                running: AtomicBool::new(false),
                worker_count,
                workers: Mutex::new(Vec::new()),
            }),
        };

        processor.register_processor(DEFAULT_PROCESSOR_ID, process_default);
        processor.register_processor("visa-processor", process_visa);
        processor.register_processor("mastercard-processor", process_mastercard);

        processor
    }

    /// Spawns the worker threads. Idempotent: a running engine is left
    /// untouched.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut workers = self.inner.workers.lock().unwrap();
        for _ in 0..self.inner.worker_count {
            let inner = Arc::clone(&self.inner);
            workers.push(thread::spawn(move || worker_loop(inner)));
        }
        tracing::info!(workers = self.inner.worker_count, "engine started");
    }

    /// Signals shutdown and joins every worker. Idempotent.
    ///
    /// Transactions still queued when the workers exit are discarded;
    /// lookups for them keep reporting `Pending`.
    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }

        let handles: Vec<_> = {
            let mut workers = self.inner.workers.lock().unwrap();
            workers.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.join();
        }
        tracing::info!("engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Registers or replaces a processor. Handlers registered while the
    /// engine runs are seen by subsequently dispatched transactions.
    pub fn register_processor<H>(&self, processor_id: impl Into<String>, handler: H)
    where
        H: ProcessorHandler + 'static,
    {
        let mut processors = self.inner.processors.lock().unwrap();
        processors.insert(processor_id.into(), Arc::new(handler));
    }

    pub fn add_currency_route(
        &self,
        currency: impl Into<String>,
        processor_id: impl Into<String>,
    ) {
        self.inner.router.add_currency_route(currency, processor_id);
    }

    pub fn add_card_brand_route(&self, brand: impl Into<String>, processor_id: impl Into<String>) {
        self.inner.router.add_card_brand_route(brand, processor_id);
    }

    /// Queues a transaction for processing. Never blocks.
    pub fn submit_transaction(&self, tx: Transaction) {
        self.inner.pending.enqueue(tx);
    }

    /// Status of a processed transaction, or `Pending` when no result has
    /// been published for the id.
    pub fn get_transaction_status(&self, transaction_id: &str) -> TransactionStatus {
        let results = self.inner.results.lock().unwrap();
        results
            .get(transaction_id)
            .map(|tx| tx.status)
            .unwrap_or(TransactionStatus::Pending)
    }

    /// Snapshot of a processed transaction, or the empty sentinel when no
    /// result has been published for the id.
    pub fn get_transaction_result(&self, transaction_id: &str) -> Transaction {
        let results = self.inner.results.lock().unwrap();
        results
            .get(transaction_id)
            .cloned()
            .unwrap_or_else(Transaction::sentinel)
    }
}

fn worker_loop(inner: Arc<EngineInner>) {
    while inner.running.load(Ordering::SeqCst) {
        if let Some(tx) = inner.pending.dequeue(POLL_INTERVAL) {
            process_one(&inner, tx);
        }
    }
}

fn process_one(inner: &EngineInner, mut tx: Transaction) {
    tx.status = TransactionStatus::Processing;

    let processor_id = inner.router.processor_for(&tx);
    // The handler Arc is cloned out so the registry lock is not held during
    // invocation.
    let handler = {
        let processors = inner.processors.lock().unwrap();
        processors
            .get(&processor_id)
            .or_else(|| processors.get(DEFAULT_PROCESSOR_ID))
            .cloned()
    };

    match handler {
        Some(handler) => {
            let invocation = panic::catch_unwind(AssertUnwindSafe(|| handler.process(&mut tx)));
            if invocation.is_err() {
                tracing::warn!(id = %tx.id, processor = %processor_id, "processor panicked");
                tx.fail("96", "Processor failure");
            }
        }
        None => {
            tracing::warn!(id = %tx.id, processor = %processor_id, "no processor registered");
            tx.fail("91", "No processor available");
        }
    }

    tx.processed_at = Some(chrono::Utc::now());
    tracing::debug!(id = %tx.id, status = ?tx.status, code = %tx.response_code, "transaction processed");

    let mut results = inner.results.lock().unwrap();
    results.insert(tx.id.clone(), tx);
}

// Illustrative processors registered at construction. They simulate
// acquirer latency and issue ISO-8583-style response codes.

fn process_default(tx: &mut Transaction) {
    simulate_network_delay(50, 250);
    if tx.amount < Decimal::from(10_000) {
        tx.approve("00", "Approved");
    } else {
        tx.decline("51", "Insufficient funds");
    }
}

fn process_visa(tx: &mut Transaction) {
    simulate_network_delay(30, 130);
    if rand::thread_rng().gen_range(0..100) < 95 {
        tx.approve("00", "Approved by Visa");
    } else {
        tx.decline("05", "Do not honor");
    }
}

fn process_mastercard(tx: &mut Transaction) {
    simulate_network_delay(40, 190);
    if rand::thread_rng().gen_range(0..100) < 92 {
        tx.approve("00", "Approved by Mastercard");
    } else {
        tx.decline("54", "Expired card");
    }
}

fn simulate_network_delay(min_ms: u64, max_ms: u64) {
    let delay = rand::thread_rng().gen_range(min_ms..=max_ms);
    thread::sleep(Duration::from_millis(delay));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionType;
    use rust_decimal_macros::dec;

    fn tx(id: &str, amount: Decimal) -> Transaction {
        Transaction::new(
            id,
            TransactionType::Payment,
            amount,
            "USD",
            "token",
            "merchant-1",
        )
    }

    #[test]
    fn test_unknown_id_reports_pending_sentinel() {
        let engine = TransactionProcessor::new(1);
        assert_eq!(
            engine.get_transaction_status("missing"),
            TransactionStatus::Pending
        );

        let result = engine.get_transaction_result("missing");
        assert!(result.id.is_empty());
        assert_eq!(result.amount, Decimal::ZERO);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let engine = TransactionProcessor::new(2);
        engine.start();
        engine.start();
        assert!(engine.is_running());

        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_registry_fallback_to_default() {
        let engine = TransactionProcessor::new(1);
        engine.register_processor(DEFAULT_PROCESSOR_ID, |tx: &mut Transaction| {
            tx.approve("00", "fallback");
        });
        // Route to an id with no registered handler.
        engine.add_currency_route("USD", "missing-processor");

        process_one(&engine.inner, tx("tx-1", dec!(1.0)));

        let result = engine.get_transaction_result("tx-1");
        assert_eq!(result.status, TransactionStatus::Approved);
        assert_eq!(result.response_message, "fallback");
    }

    #[test]
    fn test_empty_registry_marks_error() {
        let engine = TransactionProcessor::new(1);
        engine.inner.processors.lock().unwrap().clear();

        process_one(&engine.inner, tx("tx-1", dec!(1.0)));

        let result = engine.get_transaction_result("tx-1");
        assert_eq!(result.status, TransactionStatus::Error);
        assert_eq!(result.response_code, "91");
        assert!(result.processed_at.is_some());
    }

    #[test]
    fn test_later_result_overwrites_earlier() {
        let engine = TransactionProcessor::new(1);
        engine.register_processor(DEFAULT_PROCESSOR_ID, |tx: &mut Transaction| {
            tx.approve("00", "ok");
        });

        process_one(&engine.inner, tx("tx-1", dec!(1.0)));
        engine.register_processor(DEFAULT_PROCESSOR_ID, |tx: &mut Transaction| {
            tx.decline("05", "second pass");
        });
        process_one(&engine.inner, tx("tx-1", dec!(1.0)));

        let result = engine.get_transaction_result("tx-1");
        assert_eq!(result.status, TransactionStatus::Declined);
        assert_eq!(result.response_message, "second pass");
    }
}
