//! HTTP transport seam and reqwest-based implementation.

use http::{HeaderMap, StatusCode};
use kcommon::BoxFuture;

use crate::ClientError;

pub type ClientFuture<'a, T> = BoxFuture<'a, T>;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// One POST exchange. Implementations report transport failures only; status
/// classification happens in the client.
pub trait HttpTransport: Send + Sync + std::fmt::Debug {
    fn post<'a>(&'a self, request: HttpRequest) -> ClientFuture<'a, Result<HttpResponse, ClientError>>;
}

#[cfg(feature = "http-reqwest")]
pub use reqwest_transport::ReqwestTransport;

#[cfg(feature = "http-reqwest")]
mod reqwest_transport {
    use std::time::Duration;

    use reqwest::Client;

    use super::{ClientFuture, HttpRequest, HttpResponse, HttpTransport};
    use crate::ClientError;

    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new(client: Client) -> Self {
            Self { client }
        }

        /// Builds a client whose per-attempt timeout is `timeout`.
        pub fn with_timeout(timeout: Duration) -> Result<Self, ClientError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|err| ClientError::configuration(err.to_string()))?;
            Ok(Self::new(client))
        }

        fn map_error(err: reqwest::Error) -> ClientError {
            if err.is_timeout() {
                ClientError::timeout(err.to_string())
            } else {
                ClientError::transport(err.to_string())
            }
        }
    }

    impl HttpTransport for ReqwestTransport {
        fn post<'a>(
            &'a self,
            request: HttpRequest,
        ) -> ClientFuture<'a, Result<HttpResponse, ClientError>> {
            Box::pin(async move {
                let response = self
                    .client
                    .post(request.url)
                    .headers(request.headers)
                    .body(request.body)
                    .send()
                    .await
                    .map_err(Self::map_error)?;

                let status = response.status();
                let body = response.bytes().await.map_err(|err| {
                    Self::map_error(err).with_context("failed to read response body")
                })?;

                Ok(HttpResponse::new(status, body.to_vec()))
            })
        }
    }
}
