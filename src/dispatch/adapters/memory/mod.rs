//! In-memory dispatch adapters for tests and local runs.

mod broker;
mod identity;

pub use broker::InMemoryMessageBroker;
pub use identity::StaticTokenProvider;
