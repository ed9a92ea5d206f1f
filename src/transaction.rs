use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// The kind of payment operation a transaction requests.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Payment,
    Refund,
    Authorization,
    Capture,
    Void,
}

/// Processing state of a transaction.
///
/// Transitions only move forward: `Pending` → `Processing` → one of the
/// terminal states. Once terminal, the response envelope never changes.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Approved,
    Declined,
    Error,
    Timeout,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionStatus::Approved
                | TransactionStatus::Declined
                | TransactionStatus::Error
                | TransactionStatus::Timeout
        )
    }
}

/// A payment instruction plus its result envelope.
///
/// Identity fields are fixed at construction; the engine fills in `status`,
/// `processed_at`, and the response fields when a processor completes.
#[derive(Debug, PartialEq, Clone)]
pub struct Transaction {
    pub id: String,
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub currency: String,
    pub card_token: String,
    pub merchant_id: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub response_code: String,
    pub response_message: String,
}

impl Transaction {
    /// Creates a pending transaction stamped with the current UTC time.
    ///
    /// The amount is normalized to two fractional digits and clamped to be
    /// non-negative.
    pub fn new(
        id: impl Into<String>,
        r#type: TransactionType,
        amount: Decimal,
        currency: impl Into<String>,
        card_token: impl Into<String>,
        merchant_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            r#type,
            amount: amount.round_dp(2).max(Decimal::ZERO),
            currency: currency.into(),
            card_token: card_token.into(),
            merchant_id: merchant_id.into(),
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
            response_code: String::new(),
            response_message: String::new(),
        }
    }

    /// The empty transaction returned when a result lookup misses.
    pub fn sentinel() -> Self {
        Self::new("", TransactionType::Payment, Decimal::ZERO, "", "", "")
    }

    pub fn approve(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.finish(TransactionStatus::Approved, code, message);
    }

    pub fn decline(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.finish(TransactionStatus::Declined, code, message);
    }

    pub fn fail(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.finish(TransactionStatus::Error, code, message);
    }

    fn finish(
        &mut self,
        status: TransactionStatus,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.status = status;
        self.response_code = code.into();
        self.response_message = message.into();
    }

    /// Renders the diagnostic JSON form of the transaction.
    ///
    /// `processed_at`, `response_code`, and `response_message` are `null`
    /// until the transaction reaches a terminal status.
    pub fn to_json(&self) -> Result<String, PaymentError> {
        Ok(serde_json::to_string(self)?)
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

impl Serialize for Transaction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Transaction", 11)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", &self.r#type)?;
        state.serialize_field("amount", &self.amount)?;
        state.serialize_field("currency", &self.currency)?;
        state.serialize_field("card_token", &self.card_token)?;
        state.serialize_field("merchant_id", &self.merchant_id)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("created_at", &format_timestamp(self.created_at))?;
        if self.status.is_terminal() {
            state.serialize_field("processed_at", &self.processed_at.map(format_timestamp))?;
            state.serialize_field("response_code", &self.response_code)?;
            state.serialize_field("response_message", &self.response_message)?;
        } else {
            state.serialize_field("processed_at", &None::<String>)?;
            state.serialize_field("response_code", &None::<String>)?;
            state.serialize_field("response_message", &None::<String>)?;
        }
        state.end()
    }
}
