use crate::domain::ledger::{
    AuthorisePaymentInput, CreatePaymentInput, GetTransactionsInput, PaymentActionInput,
};
use crate::error::ValidationErrors;

/// Local input rules checked before any ledger request is sent.
pub trait Validate {
    /// Checks every rule and reports all violations together.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for CreatePaymentInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("CustomerCode", &self.customer_code);
        errors.require("CompanyCode", &self.company_code);
        errors.require("PaymentID", &self.payment_id);
        if self.total_value.is_zero() {
            errors.add("TotalValue", "required");
        }
        if self.transactions.is_empty() {
            errors.add("Transactions", "required");
        }
        for (i, tx) in self.transactions.iter().enumerate() {
            errors.require(
                &format!("Transactions[{i}].TransactionReference"),
                &tx.transaction_reference,
            );
            if tx.value.is_zero() {
                errors.add(format!("Transactions[{i}].Value"), "required");
            }
        }
        errors.into_result()
    }
}

impl Validate for AuthorisePaymentInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("CompanyCode", &self.company_code);
        errors.require("PaymentID", &self.payment_id);
        errors.require("Email", &self.email);
        errors.into_result()
    }
}

impl Validate for PaymentActionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("CompanyCode", &self.company_code);
        errors.require("PaymentID", &self.payment_id);
        errors.into_result()
    }
}

impl Validate for GetTransactionsInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("CustomerCode", &self.customer_code);
        errors.require("CompanyCode", &self.company_code);
        errors.into_result()
    }
}
