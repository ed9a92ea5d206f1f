use crate::transaction::Transaction;
use std::collections::HashMap;
use std::sync::Mutex;

/// Processor id used when no route matches and as the registry fallback.
pub const DEFAULT_PROCESSOR_ID: &str = "default-processor";

/// Maps transactions to processor ids.
///
/// Currency routes take precedence over card-brand routes; a transaction
/// matching neither table is sent to [`DEFAULT_PROCESSOR_ID`]. Both tables
/// may be updated at any time; each lookup sees a consistent snapshot of
/// each table.
#[derive(Default)]
pub struct TransactionRouter {
    currency_routes: Mutex<HashMap<String, String>>,
    brand_routes: Mutex<HashMap<String, String>>,
}

impl TransactionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_currency_route(&self, currency: impl Into<String>, processor_id: impl Into<String>) {
        let mut routes = self.currency_routes.lock().unwrap();
        routes.insert(currency.into(), processor_id.into());
    }

    pub fn add_card_brand_route(&self, brand: impl Into<String>, processor_id: impl Into<String>) {
        let mut routes = self.brand_routes.lock().unwrap();
        routes.insert(brand.into(), processor_id.into());
    }

    /// Chooses the processor id for a transaction.
    pub fn processor_for(&self, tx: &Transaction) -> String {
        if let Some(id) = self.currency_routes.lock().unwrap().get(&tx.currency) {
            return id.clone();
        }

        let brand = extract_card_brand(&tx.card_token);
        if let Some(id) = self.brand_routes.lock().unwrap().get(brand) {
            return id.clone();
        }

        DEFAULT_PROCESSOR_ID.to_string()
    }
}

// Tokens embed a brand hint rather than real card data; a substring probe
// is all the upstream vault guarantees.
fn extract_card_brand(card_token: &str) -> &'static str {
    if card_token.contains("visa") {
        "visa"
    } else if card_token.contains("mc") {
        "mastercard"
    } else if card_token.contains("amex") {
        "amex"
    } else {
        "unknown"
    }
}
