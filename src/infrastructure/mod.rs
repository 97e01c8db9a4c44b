//! Concrete adapters for the ledger and the record stores.

pub mod in_memory;
pub mod ledger;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
