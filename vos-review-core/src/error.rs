//! The structured error shape.
//!
//! Every failure that reaches a caller, whether a non-2xx REST response, a
//! review stream that could not be opened, an `error` event in the middle of
//! a stream, or a dropped connection, is normalized into [`ApiError`]. Callers
//! never have to look at response internals to tell these apart.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A normalized API failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {detail}")]
pub struct ApiError {
    /// HTTP status of the failing response, when one exists.
    ///
    /// Absent for transport failures and for `error` events delivered
    /// inside an already-open stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Application error keyword, e.g. `document_not_found`.
    pub code: String,
    /// Human readable detail.
    pub detail: String,
}

impl ApiError {
    /// Keyword used when a failing response carries no usable `error` field.
    pub const UNKNOWN: &'static str = "unknown_error";
    /// Keyword for connection and read failures.
    pub const NETWORK: &'static str = "network_error";
    /// Keyword for a 2xx response whose body could not be decoded.
    pub const INVALID_RESPONSE: &'static str = "invalid_response";
    /// Keyword for a successful stream response that carried no body.
    pub const MISSING_BODY: &'static str = "missing_body";
    /// Keyword for an in-stream `error` event without its own `error` field.
    pub const STREAM_ERROR: &'static str = "stream_error";
    /// Keyword for a stream that could not be decoded into lines.
    pub const DECODE_ERROR: &'static str = "decode_error";
    /// Keyword for requests rejected before they were sent.
    pub const INVALID_REQUEST: &'static str = "invalid_request";

    /// Detail used for an in-stream `error` event without its own `detail`.
    pub const STREAM_ERROR_DETAIL: &'static str = "The review stream reported an error";

    /// Create an error from its parts.
    pub fn new(status: Option<u16>, code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            detail: detail.into(),
        }
    }

    /// Build an error from a failing response body.
    ///
    /// The body is read as the `{ "error"?: string, "detail"?: string }`
    /// envelope. Missing or non-string fields fall back to [`Self::UNKNOWN`]
    /// and `fallback`. A body that is not JSON at all is treated as an empty
    /// envelope. This never fails.
    pub fn from_body(status: u16, body: &[u8], fallback: &str) -> Self {
        let envelope = serde_json::from_slice::<Value>(body).ok();
        let field = |name: &str| {
            envelope
                .as_ref()
                .and_then(|value| value.get(name))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        Self {
            status: Some(status),
            code: field("error").unwrap_or_else(|| Self::UNKNOWN.to_string()),
            detail: field("detail").unwrap_or_else(|| fallback.to_string()),
        }
    }

    /// Build an error from the fields of an in-stream `error` event.
    pub fn from_stream_event(error: Option<&str>, detail: Option<&str>) -> Self {
        Self {
            status: None,
            code: error.unwrap_or(Self::STREAM_ERROR).to_string(),
            detail: detail.unwrap_or(Self::STREAM_ERROR_DETAIL).to_string(),
        }
    }

    /// A connection or read failure with no HTTP status.
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::new(None, Self::NETWORK, detail)
    }

    /// A successful response whose body could not be decoded.
    pub fn invalid_response(status: u16, detail: impl Into<String>) -> Self {
        Self::new(Some(status), Self::INVALID_RESPONSE, detail)
    }

    /// A successful stream response that carried no body to read.
    pub fn missing_body(status: Option<u16>) -> Self {
        Self::new(
            status,
            Self::MISSING_BODY,
            "The review stream response has no body",
        )
    }

    /// A request rejected locally before it reached the backend.
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(None, Self::INVALID_REQUEST, detail)
    }

    /// Check if the backend answered 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// Check if the status is in the 4xx range.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self.status, Some(400..=499))
    }

    /// Check if the status is in the 5xx range.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.status, Some(500..=599))
    }

    /// Check if repeating the same request could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.code == Self::NETWORK || self.status == Some(429) || self.is_server_error()
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
