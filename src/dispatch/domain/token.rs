//! Bearer access tokens.

use std::fmt;

/// Header name carrying the bearer token on outbound events.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Opaque access token obtained for an identity client.
///
/// The token value is never printed through `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the `Authorization` header value for this token.
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[cfg(test)]
mod tests {
    use super::AccessToken;

    #[test]
    fn bearer_header_prefixes_token() {
        assert_eq!(AccessToken::new("abc").bearer_header(), "Bearer abc");
    }

    #[test]
    fn debug_output_redacts_token() {
        let rendered = format!("{:?}", AccessToken::new("secret-value"));
        assert!(!rendered.contains("secret-value"));
    }
}
