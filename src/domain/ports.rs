use super::ledger::{
    AuthorisePaymentInput, CreatePaymentInput, GetTransactionsInput, LedgerAction,
    PaymentActionInput, TransactionsResponse,
};
use super::event::PenaltyPaymentEvent;
use super::payable::PayableResource;
use super::penalties::AccountPenalties;
use crate::error::{ConsumerError, DecodeError, HandlerError, LedgerError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// The external financial ledger. Implementations hold no state between calls
/// and never retry.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn create_payment(&self, input: &CreatePaymentInput) -> Result<(), LedgerError>;
    async fn authorise_payment(&self, input: &AuthorisePaymentInput) -> Result<(), LedgerError>;
    async fn confirm_payment(&self, input: &PaymentActionInput) -> Result<(), LedgerError>;
    async fn timeout_payment(&self, input: &PaymentActionInput) -> Result<(), LedgerError>;
    async fn reject_payment(&self, input: &PaymentActionInput) -> Result<(), LedgerError>;
    async fn get_transactions(
        &self,
        input: &GetTransactionsInput,
    ) -> Result<TransactionsResponse, LedgerError>;
}

#[async_trait]
pub trait AccountPenaltiesStore: Send + Sync {
    /// Inserts `record` unless a document for its `(customer_code, company_code)`
    /// already exists. Succeeds either way.
    async fn create_account_penalties(&self, record: AccountPenalties) -> Result<()>;
    async fn get_account_penalties(
        &self,
        customer_code: &str,
        company_code: &str,
    ) -> Result<Option<AccountPenalties>>;
    /// Marks the line item matching `transaction_reference` as paid and sets
    /// `closed_at`. A missing document or item is not an error.
    async fn update_account_penalty_as_paid(
        &self,
        customer_code: &str,
        company_code: &str,
        transaction_reference: &str,
    ) -> Result<()>;
    async fn delete_account_penalties(&self, customer_code: &str, company_code: &str)
    -> Result<()>;
}

#[async_trait]
pub trait PayableResourceStore: Send + Sync {
    /// Assigns a fresh identifier to `record`, inserts it and returns the stored copy.
    async fn create_payable_resource(&self, record: PayableResource) -> Result<PayableResource>;
    /// `(customer_code, payable_ref)` need not be unique; the most recently
    /// created resource for the pair is the one returned.
    async fn get_payable_resource(
        &self,
        customer_code: &str,
        payable_ref: &str,
    ) -> Result<Option<PayableResource>>;
    /// Overwrites the payment sub-document of the resource with `record.id`.
    async fn update_payment_details(&self, record: &PayableResource) -> Result<()>;
    /// Records `action` as the last failed ledger action of the resource
    /// `get_payable_resource` resolves to.
    async fn save_e5_error(
        &self,
        customer_code: &str,
        payable_ref: &str,
        action: LedgerAction,
    ) -> Result<()>;
}

/// Connection lifecycle of a store handle.
#[async_trait]
pub trait StoreLifecycle: Send + Sync {
    async fn ping(&self) -> Result<()>;
    /// Releases the connection. Idempotent; failures are logged, never returned.
    async fn shutdown(&self);
}

/// Black-box payload decoder for partition messages.
pub trait EventDecoder: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<PenaltyPaymentEvent, DecodeError>;
}

/// Finalizes one completed penalty payment.
#[async_trait]
pub trait PaymentHandler: Send + Sync {
    async fn process_financial_penalty_payment(
        &self,
        event: &PenaltyPaymentEvent,
    ) -> Result<(), HandlerError>;
}

/// A raw message read from a partition.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionMessage {
    pub offset: u64,
    pub payload: Bytes,
}

/// One ordered partition of the payment-completion event stream.
#[async_trait]
pub trait PartitionSource: Send + Sync {
    /// Opens a subscription positioned just after the last committed offset,
    /// or at the oldest retained message when nothing has been committed.
    async fn subscribe(&self) -> Result<Box<dyn PartitionSubscription>, ConsumerError>;
}

#[async_trait]
pub trait PartitionSubscription: Send {
    /// Waits for the next message; `Ok(None)` once the partition is closed.
    ///
    /// Must be cancel-safe: dropping the future before it resolves loses no message.
    async fn next_message(&mut self) -> Result<Option<PartitionMessage>, ConsumerError>;
    async fn commit(&mut self, offset: u64) -> Result<(), ConsumerError>;
    async fn close(&mut self);
}

pub type SharedLedger = Arc<dyn Ledger>;
pub type SharedAccountPenaltiesStore = Arc<dyn AccountPenaltiesStore>;
pub type SharedPayableResourceStore = Arc<dyn PayableResourceStore>;
pub type SharedPaymentHandler = Arc<dyn PaymentHandler>;
pub type SharedEventDecoder = Arc<dyn EventDecoder>;
pub type SharedPartitionSource = Arc<dyn PartitionSource>;
