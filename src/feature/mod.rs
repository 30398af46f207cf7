//! Feature flag evaluation and caching.
//!
//! The poll cycle reads four flags at its start. [`services::FeatureGate`]
//! evaluates them concurrently through a [`ports::FeatureFlagClient`] and
//! caches the bundle in a [`ports::CacheStore`] for a short time, so
//! back-to-back polls reuse one evaluation.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
