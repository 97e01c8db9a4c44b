use super::ledger::LedgerTransaction;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current time truncated to millisecond precision, the resolution the
/// stores keep timestamps at.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// One penalty line item within an account snapshot.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PenaltyItem {
    pub transaction_reference: String,
    pub transaction_date: Option<NaiveDate>,
    pub made_up_date: Option<NaiveDate>,
    pub is_paid: bool,
    pub amount: Decimal,
    pub outstanding_amount: Decimal,
    pub transaction_type: String,
    pub transaction_sub_type: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub account_status: String,
    pub dunning_status: String,
}

impl From<LedgerTransaction> for PenaltyItem {
    fn from(tx: LedgerTransaction) -> Self {
        Self {
            transaction_reference: tx.transaction_reference,
            transaction_date: tx.transaction_date,
            made_up_date: tx.made_up_date,
            is_paid: tx.is_paid,
            amount: tx.amount,
            outstanding_amount: tx.outstanding_amount,
            transaction_type: tx.transaction_type,
            transaction_sub_type: tx.transaction_sub_type,
            description: tx.description,
            due_date: tx.due_date,
            account_status: tx.account_status,
            dunning_status: tx.dunning_status,
        }
    }
}

/// Per-customer, per-company snapshot of penalty line items.
///
/// `(customer_code, company_code)` is a natural key: stores hold at most one
/// document per pair. Line-item paid flags only ever move from `false` to
/// `true`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AccountPenalties {
    pub customer_code: String,
    pub company_code: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub data: Vec<PenaltyItem>,
}

impl AccountPenalties {
    pub fn new(
        customer_code: impl Into<String>,
        company_code: impl Into<String>,
        data: Vec<PenaltyItem>,
    ) -> Self {
        Self {
            customer_code: customer_code.into(),
            company_code: company_code.into(),
            created_at: now_millis(),
            closed_at: None,
            data,
        }
    }

    /// Builds a snapshot from the transactions the ledger reports for an account.
    pub fn from_ledger_transactions(
        customer_code: impl Into<String>,
        company_code: impl Into<String>,
        transactions: Vec<LedgerTransaction>,
    ) -> Self {
        Self::new(
            customer_code,
            company_code,
            transactions.into_iter().map(PenaltyItem::from).collect(),
        )
    }

    pub fn item(&self, transaction_reference: &str) -> Option<&PenaltyItem> {
        self.data
            .iter()
            .find(|item| item.transaction_reference == transaction_reference)
    }

    /// Marks the line item matching `transaction_reference` as paid and
    /// closes the snapshot at `closed_at`.
    ///
    /// Returns `false` and leaves the snapshot untouched when no item matches.
    pub fn mark_paid(&mut self, transaction_reference: &str, closed_at: DateTime<Utc>) -> bool {
        match self
            .data
            .iter_mut()
            .find(|item| item.transaction_reference == transaction_reference)
        {
            Some(item) => {
                item.is_paid = true;
                self.closed_at = Some(closed_at);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use rust_decimal_macros::dec;

    pub fn item(reference: &str) -> PenaltyItem {
        PenaltyItem {
            transaction_reference: reference.to_string(),
            transaction_date: NaiveDate::from_ymd_opt(2017, 11, 28),
            made_up_date: NaiveDate::from_ymd_opt(2017, 2, 28),
            is_paid: false,
            amount: dec!(150),
            outstanding_amount: dec!(150),
            transaction_type: "1".to_string(),
            transaction_sub_type: "EH".to_string(),
            description: "Late filing penalty".to_string(),
            due_date: NaiveDate::from_ymd_opt(2017, 12, 12),
            account_status: "CHS".to_string(),
            dunning_status: "PEN1".to_string(),
        }
    }

    pub fn account(customer: &str, company: &str, references: &[&str]) -> AccountPenalties {
        AccountPenalties::new(
            customer,
            company,
            references.iter().map(|r| item(r)).collect(),
        )
    }
}
