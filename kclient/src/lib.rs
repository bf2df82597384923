//! Retrying JSON-over-HTTP client used by the knows operation layer.
//!
//! The client issues one logical request per [`ApiClient::call`]: it serializes
//! the payload, POSTs it with the API key header, retries transport failures and
//! 5xx responses with capped exponential backoff, and strips the `data`
//! envelope from successful responses. Every attempt and backoff wait observes
//! the caller's [`kcommon::CancelSignal`].

mod client;
mod error;
mod resilience;
mod secret;
mod transport;

pub mod prelude {
    pub use crate::{
        ApiClient, ApiClientConfig, ClientError, ClientErrorKind, ClientOperationHooks,
        HttpTransport, RetryPolicy, SecretString,
    };
    pub use kcommon::CancelSignal;
}

pub use client::{
    API_KEY_HEADER, ApiClient, ApiClientConfig, ERROR_BODY_LIMIT, decode_response,
    truncate_for_error, unwrap_envelope,
};
pub use error::{ClientError, ClientErrorKind};
pub use resilience::{
    ClientOperationHooks, DEFAULT_BASE_BACKOFF, DEFAULT_MAX_RETRIES, MAX_BACKOFF,
    NoopClientHooks, RetryPolicy, execute_with_retry,
};
pub use secret::SecretString;
#[cfg(feature = "http-reqwest")]
pub use transport::ReqwestTransport;
pub use transport::{ClientFuture, HttpRequest, HttpResponse, HttpTransport};
