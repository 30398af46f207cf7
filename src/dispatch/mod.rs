//! Outbound event dispatch and credential resolution.
//!
//! Task invocations and history records leave the engine as
//! [`domain::DispatchEvent`] values handed to an
//! [`ports::EventDispatcher`]. The bundled
//! [`adapters::BatchingEventDispatcher`] packs events into size-bounded
//! broker batches. Bearer tokens for outbound calls come from a
//! [`ports::TokenProvider`].
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
