//! Payment settlement - fee creation, gateway confirmation and space release
//!
//! Transactions move `pending -> completed` (or `pending -> failed` on a
//! terminal gateway decline); payment attempts move
//! `initiated -> processing -> completed | failed`. The gateway charge is
//! the one step outside the store's commit boundary, so settlement is
//! at-least-once from the gateway's point of view: operators reconcile by
//! gateway reference.

mod gateway;
mod service;

pub use gateway::{
    GatewayError, GatewayReceipt, PaymentGateway, RetryPolicy, SimulatedGateway,
};
pub use service::PaymentService;

use serde::Serialize;

use crate::models::{ParkingSession, ParkingSpace, Payment, Transaction};
use crate::pricing::{FeeBreakdown, PricingRule};

/// Outcome of the idempotent transaction lookup during payment creation
#[derive(Debug)]
pub enum TransactionHandle {
    /// No transaction existed for the session; a new pending one was created
    Created(Transaction),
    /// A non-completed transaction already existed and is being reused
    Reused(Transaction),
}

impl TransactionHandle {
    pub fn was_reused(&self) -> bool {
        matches!(self, TransactionHandle::Reused(_))
    }

    pub fn into_inner(self) -> Transaction {
        match self {
            TransactionHandle::Created(transaction) => transaction,
            TransactionHandle::Reused(transaction) => transaction,
        }
    }
}

/// Response of `create_payment`
#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub payment: Payment,
    pub transaction: Transaction,
    /// True when an existing pending transaction was reused
    pub transaction_reused: bool,
    pub amount: f64,
    pub duration_minutes: i64,
    pub applied_rules: Vec<PricingRule>,
    pub breakdown: FeeBreakdown,
}

/// Response of `confirm_payment`
#[derive(Debug, Serialize)]
pub struct ConfirmPaymentResponse {
    pub payment: Payment,
    pub transaction: Transaction,
    pub session: ParkingSession,
    pub space: ParkingSpace,
    pub gateway_ref: String,
}

/// Payment with its transaction and session context
#[derive(Debug, Serialize)]
pub struct PaymentDetails {
    pub payment: Payment,
    pub transaction: Transaction,
    pub session: ParkingSession,
}

/// Generate a unique receipt number
pub(crate) fn generate_receipt_number() -> String {
    use rand::Rng;
    let random: u32 = rand::thread_rng().gen_range(0..10000);
    format!(
        "RCPT-{}-{:04}",
        chrono::Utc::now().timestamp_millis(),
        random
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_number_format() {
        let receipt = generate_receipt_number();
        let parts: Vec<&str> = receipt.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "RCPT");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 4);
    }
}
