//! Identity service port used to resolve bearer tokens.

use crate::dispatch::domain::{AccessToken, IdentityClientId};
use crate::error::ErrorKind;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for token acquisition.
pub type TokenResult<T> = Result<T, TokenError>;

/// Token acquisition contract.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtains an access token for one identity client.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] when the client is unknown or the identity
    /// service fails.
    async fn get_token(&self, client_id: &IdentityClientId) -> TokenResult<AccessToken>;

    /// Obtains tokens for several identity clients, one acquisition per
    /// distinct client.
    ///
    /// Failures are reported per client so callers can continue with the
    /// clients that resolved.
    async fn get_tokens_for_clients(
        &self,
        client_ids: &[IdentityClientId],
    ) -> HashMap<IdentityClientId, TokenResult<AccessToken>> {
        let mut distinct = client_ids.to_vec();
        distinct.sort();
        distinct.dedup();

        let lookups = distinct.iter().map(|client_id| async move {
            (client_id.clone(), self.get_token(client_id).await)
        });
        join_all(lookups).await.into_iter().collect()
    }
}

/// Errors returned by token providers.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    /// No credential configuration exists for the client.
    #[error("identity client '{0}' is not configured")]
    UnknownClient(IdentityClientId),

    /// The identity service refused or failed the request.
    #[error("token acquisition failed for identity client '{client_id}': {cause}")]
    Acquisition {
        /// Client whose token could not be obtained.
        client_id: IdentityClientId,
        /// Underlying failure.
        cause: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl TokenError {
    /// Wraps an identity-service failure for `client_id`.
    pub fn acquisition(
        client_id: IdentityClientId,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Acquisition {
            client_id,
            cause: Arc::new(err),
        }
    }

    /// Returns the identity client the failure relates to.
    #[must_use]
    pub const fn client_id(&self) -> &IdentityClientId {
        match self {
            Self::UnknownClient(client_id) | Self::Acquisition { client_id, .. } => client_id,
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::CredentialResolution
    }
}
