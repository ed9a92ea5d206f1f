use fintechx_core::engine::TransactionProcessor;
use fintechx_core::transaction::{Transaction, TransactionType};
use rust_decimal::Decimal;
use std::thread;
use std::time::{Duration, Instant};

pub fn payment(id: &str, amount: Decimal, currency: &str, card_token: &str) -> Transaction {
    Transaction::new(
        id,
        TransactionType::Payment,
        amount,
        currency,
        card_token,
        "merchant-it",
    )
}

/// Polls the engine until the transaction reaches a terminal status or the
/// timeout elapses.
pub fn wait_for_terminal(
    engine: &TransactionProcessor,
    id: &str,
    timeout: Duration,
) -> Option<Transaction> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        let result = engine.get_transaction_result(id);
        if result.status.is_terminal() {
            return Some(result);
        }
        thread::sleep(Duration::from_millis(10));
    }
    None
}
