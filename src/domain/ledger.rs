use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A state-changing operation against the ledger for one payment session.
///
/// `Create` locks the customer's ledger account, `Authorise` keeps it locked
/// until funds are confirmed, and `Confirm` settles and unlocks it. `Timeout`
/// and `Reject` unlock without settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerAction {
    Create,
    Authorise,
    Confirm,
    Timeout,
    Reject,
}

impl LedgerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Authorise => "authorise",
            Self::Confirm => "confirm",
            Self::Timeout => "timeout",
            Self::Reject => "reject",
        }
    }

    /// Request path of the action, relative to the ledger base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Create => "/arTransactions/payment",
            Self::Authorise => "/arTransactions/payment/authorise",
            Self::Confirm => "/arTransactions/payment/confirm",
            Self::Timeout => "/arTransactions/payment/timeout",
            Self::Reject => "/arTransactions/payment/reject",
        }
    }
}

impl fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One penalty being paid as part of a payment session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentTransaction {
    pub transaction_reference: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentInput {
    pub customer_code: String,
    pub company_code: String,
    pub payment_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
    pub transactions: Vec<CreatePaymentTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorisePaymentInput {
    pub company_code: String,
    pub payment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorisation_id: Option<String>,
    pub email: String,
}

/// Input shared by the confirm, timeout and reject actions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentActionInput {
    pub company_code: String,
    pub payment_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetTransactionsInput {
    pub customer_code: String,
    pub company_code: String,
}

/// Read-only projection of a ledger transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub company_code: String,
    #[serde(default)]
    pub ledger_code: String,
    pub customer_code: String,
    pub transaction_reference: String,
    #[serde(default)]
    pub transaction_date: Option<NaiveDate>,
    #[serde(default)]
    pub made_up_date: Option<NaiveDate>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub outstanding_amount: Decimal,
    pub is_paid: bool,
    #[serde(default)]
    pub transaction_type: String,
    #[serde(default)]
    pub transaction_sub_type: String,
    #[serde(default, alias = "typeDescription")]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub account_status: String,
    #[serde(default)]
    pub dunning_status: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
    pub number: u64,
}

/// Reads an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Result of a `GetTransactions` query. An empty ledger yields an empty
/// `data` list and a zero-size page, whether the fields are missing or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub page: Page,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<LedgerTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubError {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub rejected_value: Option<serde_json::Value>,
    #[serde(default)]
    pub message: String,
}

/// Error body returned by the ledger for any non-200 response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub http_status_code: u16,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message_code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub debug_message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_errors: Vec<SubError>,
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)?;
        if let Some(code) = &self.message_code {
            write!(f, " [{code}]")?;
        }
        Ok(())
    }
}
