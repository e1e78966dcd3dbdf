//! # vos-review-client
//!
//! HTTP client for the VOS review backend.
//!
//! - **[`ApiClient`]**: REST calls for documents, personas, reviews and jobs
//! - **[`ApiClient::stream_review`]**: callback-style review stream session
//! - **[`ApiClient::review_events`]**: the same session as a pull-style stream
//! - **[`ClientConfig`]**: base URL, timeouts and CSRF token, from code or
//!   the environment
//!
//! ## Example
//!
//! ```no_run
//! use vos_review_client::{ApiClient, ClientConfig};
//!
//! # async fn run() -> Result<(), vos_review_core::ApiError> {
//! let client = ApiClient::new(ClientConfig::from_env())?;
//!
//! let handle = client.stream_review(
//!     "doc-1",
//!     ["security", "clarity"],
//!     |event| println!("{} event", event.kind()),
//!     |error| eprintln!("review error: {error}"),
//! );
//!
//! let report = handle.finished().await;
//! println!("stream {}", report.outcome);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod session;

// Re-exports
pub use client::ApiClient;
pub use config::{
    ClientConfig, CSRF_HEADER, DEFAULT_API_PREFIX, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use session::{CancelHandle, ReviewEvents, SessionState, StreamHandle, STREAM_SETUP_FALLBACK};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        ApiClient, CancelHandle, ClientConfig, ReviewEvents, SessionState, StreamHandle,
    };
}
