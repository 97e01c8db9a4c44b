//! Inbound event plumbing: payload decoding and an in-process partition.

pub mod decoder;
pub mod partition;

pub use decoder::JsonEventDecoder;
pub use partition::MemoryPartition;
