//! Application layer: the payment-finalization pipeline.
//!
//! `PaymentConsumer` reads one partition sequentially and hands every decoded
//! event to `PenaltyPaymentHandler`, which confirms the payment with the ledger
//! and then marks the penalties paid in the cache. `Supervisor` wraps the
//! consumer and restarts it whenever it fails or panics.

pub mod consumer;
pub mod handler;
pub mod penalties;
pub mod supervisor;
