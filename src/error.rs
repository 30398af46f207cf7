//! Error classification shared by service-level errors.
//!
//! Each service error enum maps its variants onto an [`ErrorKind`] so the
//! outer HTTP layer can choose a status code without matching on every
//! variant.

use serde::{Deserialize, Serialize};

/// Coarse error category for caller-facing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The referenced schedule or task does not exist. Never retried.
    NotFound,
    /// The request is malformed. Never retried.
    Validation,
    /// A concurrent writer changed the record first.
    Conflict,
    /// An access token could not be obtained for an identity client.
    CredentialResolution,
    /// The event broker rejected a batch.
    DispatchBatch,
    /// A collaborator is unreachable or failed unexpectedly.
    Unavailable,
    /// The operation was cancelled by the caller.
    Cancelled,
}

impl ErrorKind {
    /// Returns the canonical lowercase representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::CredentialResolution => "credential_resolution",
            Self::DispatchBatch => "dispatch_batch",
            Self::Unavailable => "unavailable",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when retrying the same request cannot succeed.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(self, Self::NotFound | Self::Validation)
    }
}
