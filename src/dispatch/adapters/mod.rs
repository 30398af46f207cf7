//! Adapter implementations for dispatch ports.

mod batching;
pub mod memory;

pub use batching::{BatchingEventDispatcher, EventEnvelope};
