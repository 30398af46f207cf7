//! Port contracts for outbound dispatch.
//!
//! Ports define infrastructure-agnostic interfaces for the event broker and
//! the identity service.

pub mod broker;
pub mod dispatcher;
pub mod identity;

pub use broker::{BrokerError, BrokerResult, MessageBroker};
#[cfg(test)]
pub use dispatcher::MockEventDispatcher;
pub use dispatcher::{EventDispatchError, EventDispatchResult, EventDispatcher};
pub use identity::{TokenError, TokenProvider, TokenResult};
