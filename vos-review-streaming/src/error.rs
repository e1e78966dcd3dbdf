//! Streaming errors.

use thiserror::Error;
use vos_review_core::ApiError;

/// Errors that end a review stream from inside the pipeline.
///
/// These never reach a caller directly; they are converted into an
/// [`ApiError`] once, when the pipeline reports its terminal failure.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Reading the response body failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response carried no body to read.
    #[error("Response has no body")]
    MissingBody,

    /// A line grew past the buffer limit without a newline.
    #[error("Line exceeds {limit} bytes without a newline")]
    BufferOverflow {
        /// The configured limit.
        limit: usize,
    },
}

impl StreamError {
    /// Create a transport error from any error.
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        Self::Transport(err.to_string())
    }

    /// Convert into the structured error shape.
    ///
    /// `status` is the HTTP status of the stream response, used only for
    /// [`StreamError::MissingBody`]. Read failures happen after the status
    /// was already accepted and carry none.
    #[must_use]
    pub fn into_api_error(self, status: Option<u16>) -> ApiError {
        match self {
            Self::Transport(detail) => ApiError::transport(detail),
            Self::MissingBody => ApiError::missing_body(status),
            err @ Self::BufferOverflow { .. } => {
                ApiError::new(None, ApiError::DECODE_ERROR, err.to_string())
            }
        }
    }
}

impl From<StreamError> for ApiError {
    fn from(err: StreamError) -> Self {
        err.into_api_error(None)
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StreamError::BufferOverflow { limit: 16 };
        assert_eq!(err.to_string(), "Line exceeds 16 bytes without a newline");
    }

    #[test]
    fn test_into_api_error() {
        let err = StreamError::transport("connection reset").into_api_error(Some(200));
        assert_eq!(err.code, ApiError::NETWORK);
        assert_eq!(err.status, None);
        assert!(err.detail.contains("connection reset"));

        let err = StreamError::MissingBody.into_api_error(Some(204));
        assert_eq!(err.code, ApiError::MISSING_BODY);
        assert_eq!(err.status, Some(204));

        let err: ApiError = StreamError::BufferOverflow { limit: 8 }.into();
        assert_eq!(err.code, ApiError::DECODE_ERROR);
    }
}
