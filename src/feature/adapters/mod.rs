//! Adapter implementations for feature ports.

pub mod memory;
