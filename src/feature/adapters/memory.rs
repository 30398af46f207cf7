//! In-memory cache and static flag adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::feature::ports::{
    CacheError, CacheResult, CacheStore, FeatureFlagClient, FeatureFlagError, FeatureFlagResult,
};

#[derive(Debug, Clone)]
struct CachedValue {
    bytes: Vec<u8>,
    expires_at: DateTime<Utc>,
}

/// Process-local cache whose entries expire according to an injected clock.
#[derive(Debug)]
pub struct InMemoryCacheStore<C>
where
    C: Clock + Send + Sync,
{
    entries: RwLock<HashMap<String, CachedValue>>,
    clock: Arc<C>,
}

impl<C> InMemoryCacheStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

fn poisoned(err: impl std::fmt::Display) -> CacheError {
    CacheError::backend(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl<C> CacheStore for InMemoryCacheStore<C>
where
    C: Clock + Send + Sync,
{
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let now = self.clock.utc();
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .get(key)
            .filter(|cached| now < cached.expires_at)
            .map(|cached| cached.bytes.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let lifetime = chrono::Duration::from_std(ttl).map_err(CacheError::backend)?;
        let expires_at = self.clock.utc() + lifetime;
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(
            key.to_owned(),
            CachedValue {
                bytes: value,
                expires_at,
            },
        );
        Ok(())
    }
}

/// Flag client answering from a fixed table.
///
/// Unknown flags evaluate to `false`. The client can be switched into an
/// unavailable state to simulate an unreachable flag service.
#[derive(Debug, Clone, Default)]
pub struct StaticFeatureFlags {
    flags: Arc<RwLock<HashMap<String, bool>>>,
    unavailable: Arc<AtomicBool>,
    evaluations: Arc<AtomicUsize>,
}

impl StaticFeatureFlags {
    /// Creates a client with every flag off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `flag_key` and returns the client.
    #[must_use]
    pub fn with_flag(self, flag_key: impl Into<String>, value: bool) -> Self {
        self.set_flag(flag_key, value);
        self
    }

    /// Sets `flag_key`.
    pub fn set_flag(&self, flag_key: impl Into<String>, value: bool) {
        if let Ok(mut flags) = self.flags.write() {
            flags.insert(flag_key.into(), value);
        }
    }

    /// Makes subsequent evaluations fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the number of evaluations performed.
    #[must_use]
    pub fn evaluation_count(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeatureFlagClient for StaticFeatureFlags {
    async fn evaluate(&self, flag_key: &str) -> FeatureFlagResult<bool> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FeatureFlagError::unavailable(
                flag_key,
                std::io::Error::other("flag service unreachable"),
            ));
        }
        let flags = self.flags.read().map_err(|err| {
            FeatureFlagError::unavailable(flag_key, std::io::Error::other(err.to_string()))
        })?;
        Ok(flags.get(flag_key).copied().unwrap_or(false))
    }
}
