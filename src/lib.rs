//! `httpc` is a blocking HTTP convenience client: per-method default
//! headers, form fields, and basic-auth credentials are managed centrally
//! and applied to every request, and failed attempts are retried under a
//! configurable policy.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use httpc::prelude::{HttpClient, RetryPolicy};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::builder()
//!         .client_name("my-sdk")
//!         .retry_policy(
//!             RetryPolicy::standard()
//!                 .max_attempts(3)
//!                 .retry_wait(Duration::from_secs(2))
//!                 .retryable_status_codes([502, 503]),
//!         )
//!         .build();
//!
//!     client.set_header("post", "x-api-key", "secret-token")?;
//!     let response = client.post("https://api.example.com/v1/items", r#"{"name":"demo"}"#)?;
//!     println!("status={} bytes={}", response.status(), response.body().len());
//!     Ok(())
//! }
//! ```
//!
//! # Recommended Defaults
//!
//! - Retry-by-status is opt-in: no status code triggers a retry until it
//!   is listed via [`RetryPolicy::retryable_status_codes`].
//! - Bound slow endpoints with a [`CancelToken::with_timeout`] context;
//!   one deadline covers the whole retry sequence, waits included.

mod client;
mod config;
mod context;
mod error;
mod request;
mod response;
mod retry;
mod transport;
mod util;

pub use crate::client::{HttpClient, HttpClientBuilder};
pub use crate::config::{BasicAuth, ConfigStore};
pub use crate::context::{CancelReason, CancelToken, SystemWaiter, Waiter};
pub use crate::error::{HttpClientError, HttpClientErrorCode, TransportErrorKind};
pub use crate::request::RequestHook;
pub use crate::response::HttpResponse;
pub use crate::retry::RetryPolicy;

pub type HttpcResult<T> = std::result::Result<T, HttpClientError>;

pub mod prelude {
    pub use crate::{
        BasicAuth, CancelReason, CancelToken, ConfigStore, HttpClient, HttpClientError,
        HttpClientErrorCode, HttpResponse, HttpcResult, RequestHook, RetryPolicy, SystemWaiter,
        TransportErrorKind, Waiter,
    };
}
