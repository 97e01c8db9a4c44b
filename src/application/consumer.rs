use crate::domain::ports::{
    PartitionMessage, SharedEventDecoder, SharedPartitionSource, SharedPaymentHandler,
};
use crate::error::ConsumerError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Consumes payment-completion events from one partition and hands each to
/// the payment handler, strictly one at a time.
///
/// Undecodable messages and handler errors are logged and skipped; either
/// way the offset is committed and the next message is read. Panics raised
/// by the handler are not caught here.
#[derive(Clone)]
pub struct PaymentConsumer {
    source: SharedPartitionSource,
    decoder: SharedEventDecoder,
    handler: SharedPaymentHandler,
}

impl PaymentConsumer {
    pub fn new(
        source: SharedPartitionSource,
        decoder: SharedEventDecoder,
        handler: SharedPaymentHandler,
    ) -> Self {
        Self {
            source,
            decoder,
            handler,
        }
    }

    /// Runs until `shutdown` is cancelled or the subscription fails.
    ///
    /// Cancellation is only observed between messages, so a message being
    /// handled when the signal arrives is finished first.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), ConsumerError> {
        let mut subscription = self.source.subscribe().await?;
        info!("payment consumer subscribed");

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    subscription.close().await;
                    info!("payment consumer shutting down");
                    return Ok(());
                }
                next = subscription.next_message() => next,
            };

            let message = match next {
                Ok(Some(message)) => message,
                Ok(None) => {
                    subscription.close().await;
                    return Err(ConsumerError::SubscriptionClosed);
                }
                Err(e) => {
                    subscription.close().await;
                    return Err(e);
                }
            };

            self.handle(&message).await;
            subscription.commit(message.offset).await?;
        }
    }

    async fn handle(&self, message: &PartitionMessage) {
        let event = match self.decoder.decode(&message.payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(offset = message.offset, error = %e, "dropping undecodable message");
                return;
            }
        };

        match self.handler.process_financial_penalty_payment(&event).await {
            Ok(()) => info!(
                offset = message.offset,
                payment_id = %event.payment_id,
                "payment event processed"
            ),
            Err(e) => error!(
                offset = message.offset,
                customer_code = %event.customer_code,
                company_code = %event.company_code,
                payment_id = %event.payment_id,
                error = %e,
                "failed to process payment event"
            ),
        }
    }
}
