use crate::domain::event::PenaltyPaymentEvent;
use crate::domain::ledger::{LedgerAction, PaymentActionInput};
use crate::domain::ports::{
    PaymentHandler, SharedAccountPenaltiesStore, SharedLedger, SharedPayableResourceStore,
};
use crate::error::HandlerError;
use async_trait::async_trait;
use tracing::{error, info};

/// Finalizes a completed penalty payment: confirms the payment session with
/// the ledger, then marks each paid penalty in the account penalties cache.
///
/// Replaying an event after a crash between the two steps is only safe while
/// the ledger answers a repeated confirm with 200. Marking paid is idempotent
/// by construction, but any other answer to the replayed confirm is treated
/// as a failure, and the penalty then stays unpaid in the cache.
#[derive(Clone)]
pub struct PenaltyPaymentHandler {
    ledger: SharedLedger,
    account_penalties: SharedAccountPenaltiesStore,
    payable_resources: SharedPayableResourceStore,
}

impl PenaltyPaymentHandler {
    /// Creates a new `PenaltyPaymentHandler`.
    ///
    /// # Arguments
    ///
    /// * `ledger` - The ledger payment sessions are confirmed with.
    /// * `account_penalties` - The cache the paid penalties are marked in.
    /// * `payable_resources` - The store ledger failures are recorded on.
    pub fn new(
        ledger: SharedLedger,
        account_penalties: SharedAccountPenaltiesStore,
        payable_resources: SharedPayableResourceStore,
    ) -> Self {
        Self {
            ledger,
            account_penalties,
            payable_resources,
        }
    }

    async fn record_ledger_failure(&self, event: &PenaltyPaymentEvent, action: LedgerAction) {
        if let Err(e) = self
            .payable_resources
            .save_e5_error(&event.customer_code, &event.payable_ref, action)
            .await
        {
            error!(
                customer_code = %event.customer_code,
                payable_ref = %event.payable_ref,
                %action,
                error = %e,
                "failed to record ledger failure on payable resource"
            );
        }
    }
}

#[async_trait]
impl PaymentHandler for PenaltyPaymentHandler {
    async fn process_financial_penalty_payment(
        &self,
        event: &PenaltyPaymentEvent,
    ) -> Result<(), HandlerError> {
        let input = PaymentActionInput {
            company_code: event.company_code.clone(),
            payment_id: event.payment_id.clone(),
        };

        if let Err(source) = self.ledger.confirm_payment(&input).await {
            error!(
                customer_code = %event.customer_code,
                company_code = %event.company_code,
                payment_id = %event.payment_id,
                error = %source,
                "ledger confirm failed"
            );
            self.record_ledger_failure(event, LedgerAction::Confirm).await;
            return Err(HandlerError::Ledger {
                action: LedgerAction::Confirm,
                source,
            });
        }

        for payment in &event.transaction_payments {
            self.account_penalties
                .update_account_penalty_as_paid(
                    &event.customer_code,
                    &event.company_code,
                    &payment.transaction_reference,
                )
                .await?;
        }

        info!(
            customer_code = %event.customer_code,
            company_code = %event.company_code,
            payment_id = %event.payment_id,
            penalties = event.transaction_payments.len(),
            "penalty payment finalized"
        );
        Ok(())
    }
}
