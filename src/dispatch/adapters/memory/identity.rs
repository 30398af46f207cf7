//! Static token provider.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::dispatch::{
    domain::{AccessToken, IdentityClientId},
    ports::{TokenError, TokenProvider, TokenResult},
};

/// Token provider backed by a fixed client-to-token map.
///
/// Unknown clients fail with [`TokenError::UnknownClient`]. Every
/// acquisition is counted so tests can assert on token reuse.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    tokens: Arc<RwLock<HashMap<IdentityClientId, String>>>,
    acquisitions: Arc<AtomicUsize>,
}

impl StaticTokenProvider {
    /// Creates a provider with no configured clients.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for `client_id`.
    #[must_use]
    pub fn with_token(
        self,
        client_id: impl Into<IdentityClientId>,
        token: impl Into<String>,
    ) -> Self {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(client_id.into(), token.into());
        }
        self
    }

    /// Returns the number of token acquisitions served or refused.
    #[must_use]
    pub fn acquisition_count(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self, client_id: &IdentityClientId) -> TokenResult<AccessToken> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        let tokens = self.tokens.read().map_err(|err| {
            TokenError::acquisition(client_id.clone(), std::io::Error::other(err.to_string()))
        })?;
        tokens
            .get(client_id)
            .map(AccessToken::new)
            .ok_or_else(|| TokenError::UnknownClient(client_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn batch_lookup_acquires_once_per_distinct_client() {
        let provider = StaticTokenProvider::new()
            .with_token("alpha", "token-a")
            .with_token("beta", "token-b");
        let clients = vec![
            IdentityClientId::from("alpha"),
            IdentityClientId::from("beta"),
            IdentityClientId::from("alpha"),
            IdentityClientId::from("gamma"),
        ];

        let tokens = provider.get_tokens_for_clients(&clients).await;

        assert_eq!(provider.acquisition_count(), 3);
        assert_eq!(tokens.len(), 3);
        assert!(matches!(
            tokens.get(&IdentityClientId::from("gamma")),
            Some(Err(TokenError::UnknownClient(_)))
        ));
        let alpha = tokens
            .get(&IdentityClientId::from("alpha"))
            .and_then(|result| result.as_ref().ok())
            .expect("alpha token should resolve");
        assert_eq!(alpha.expose(), "token-a");
    }
}
