//! Record types, ledger protocol types and the ports the application layer
//! depends on.

pub mod event;
pub mod ledger;
pub mod payable;
pub mod penalties;
pub mod ports;
