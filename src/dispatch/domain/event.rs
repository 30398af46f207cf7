//! Outbound dispatch events.

use super::{AUTHORIZATION_HEADER, AccessToken, InvocationId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// HTTP verb used by an outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl HttpMethod {
    /// Returns the canonical uppercase verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

/// Error returned when a method string is not a supported HTTP verb.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported HTTP method: {0}")]
pub struct ParseHttpMethodError(pub String);

impl TryFrom<&str> for HttpMethod {
    type Error = ParseHttpMethodError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(ParseHttpMethodError(value.to_owned())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound HTTP call to be performed by the event consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchEvent {
    /// Target URL.
    pub endpoint: String,
    /// HTTP verb.
    pub method: HttpMethod,
    /// JSON body, if any.
    #[serde(rename = "json")]
    pub payload: Option<Value>,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Routing key describing what produced the event.
    pub event_key: String,
    /// Correlation identifier linking the event to its history record.
    pub invocation_id: InvocationId,
}

impl DispatchEvent {
    /// Creates an event without headers.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        method: HttpMethod,
        payload: Option<Value>,
        event_key: impl Into<String>,
        invocation_id: InvocationId,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            payload,
            headers: BTreeMap::new(),
            event_key: event_key.into(),
            invocation_id,
        }
    }

    /// Adds a bearer `Authorization` header derived from `token`.
    #[must_use]
    pub fn with_bearer_token(mut self, token: &AccessToken) -> Self {
        self.headers
            .insert(AUTHORIZATION_HEADER.to_owned(), token.bearer_header());
        self
    }

    /// Returns the `Authorization` header value, if present.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.headers.get(AUTHORIZATION_HEADER).map(String::as_str)
    }
}
