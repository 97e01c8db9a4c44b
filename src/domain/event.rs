use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayment {
    pub transaction_reference: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

/// Inbound notification that a card payment for penalties has completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyPaymentEvent {
    #[serde(default)]
    pub attempt: i32,
    pub company_code: String,
    pub customer_code: String,
    pub payment_id: String,
    #[serde(default)]
    pub external_payment_id: String,
    #[serde(default)]
    pub payment_reference: String,
    #[serde(default)]
    pub payment_amount: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
    #[serde(default)]
    pub transaction_payments: Vec<TransactionPayment>,
    #[serde(default)]
    pub card_type: String,
    #[serde(default)]
    pub email: String,
    pub payable_ref: String,
}
