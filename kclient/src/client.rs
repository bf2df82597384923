//! Retrying JSON POST client with envelope unwrapping.
//!
//! ```rust
//! use serde_json::json;
//! use kclient::unwrap_envelope;
//!
//! assert_eq!(unwrap_envelope(json!({"data": {"id": 1}})), json!({"id": 1}));
//! assert_eq!(unwrap_envelope(json!({"data": null, "code": 0})), json!({"data": null, "code": 0}));
//! assert_eq!(unwrap_envelope(json!([1, 2])), json!([1, 2]));
//! ```

use std::sync::Arc;

use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use kcommon::CancelSignal;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    ClientError, ClientOperationHooks, HttpRequest, HttpResponse, HttpTransport, NoopClientHooks,
    RetryPolicy, SecretString, execute_with_retry,
};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const ERROR_BODY_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub retry: RetryPolicy,
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<SecretString>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    headers: HeaderMap,
    policy: RetryPolicy,
    hooks: Arc<dyn ClientOperationHooks>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("transport", &self.transport)
            .field("base_url", &self.base_url)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: ApiClientConfig, transport: Arc<dyn HttpTransport>) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::configuration("base url must not be empty"));
        }
        if config.api_key.is_empty() {
            return Err(ClientError::configuration("api key must not be empty"));
        }

        let mut api_key = HeaderValue::from_str(config.api_key.expose().trim())
            .map_err(|_| ClientError::configuration("api key is not a valid header value"))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);

        Ok(Self {
            transport,
            base_url,
            headers,
            policy: config.retry,
            hooks: Arc::new(NoopClientHooks),
        })
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ClientOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Sends `payload` to `path` and returns the unwrapped response value.
    ///
    /// Transport failures and 5xx responses are retried per the policy; any
    /// other failure, or the signal firing, ends the call immediately.
    pub async fn call<P>(&self, path: &str, payload: &P, signal: &CancelSignal) -> Result<Value, ClientError>
    where
        P: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(payload).map_err(|err| {
            ClientError::serialization(format!("failed to encode request for {path}: {err}"))
        })?;
        let url = self.endpoint(path);

        execute_with_retry(
            path,
            &self.policy,
            self.hooks.as_ref(),
            |_attempt| self.attempt(path, &url, &body, signal),
            |delay| async move { signal.sleep(delay).await.map_err(ClientError::from) },
        )
        .await
    }

    async fn attempt(
        &self,
        path: &str,
        url: &str,
        body: &[u8],
        signal: &CancelSignal,
    ) -> Result<Value, ClientError> {
        let request = HttpRequest {
            url: url.to_string(),
            headers: self.headers.clone(),
            body: body.to_vec(),
        };

        match signal.run(self.transport.post(request)).await? {
            Ok(response) => decode_response(path, response),
            Err(error) => match signal.interruption() {
                Some(interruption) => Err(interruption.into()),
                None => Err(error.with_context(format!("request to {path} failed"))),
            },
        }
    }
}

pub fn decode_response(path: &str, response: HttpResponse) -> Result<Value, ClientError> {
    let status = response.status;
    if !status.is_success() {
        return Err(status_error(path, status, &response.body));
    }

    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    let raw: Value = serde_json::from_slice(&response.body).map_err(|err| {
        ClientError::decode(format!("failed to decode response from {path}: {err}"))
    })?;

    Ok(unwrap_envelope(raw))
}

/// Returns the nested `data` value when the response is a `{"data": ...}` envelope.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            Some(data) => {
                map.insert("data".to_string(), data);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

pub fn truncate_for_error(value: &str, max: usize) -> String {
    let value = value.trim();
    if max == 0 || value.chars().count() <= max {
        return value.to_string();
    }

    let mut truncated = value.chars().take(max).collect::<String>();
    truncated.push_str("...");
    truncated
}

fn status_error(path: &str, status: StatusCode, body: &[u8]) -> ClientError {
    let body = truncate_for_error(&String::from_utf8_lossy(body), ERROR_BODY_LIMIT);
    let message = format!(
        "request to {path} failed with status {}: {body}",
        status.as_u16()
    );

    if status.is_server_error() {
        ClientError::server_status(status.as_u16(), message)
    } else {
        ClientError::client_status(status.as_u16(), message)
    }
}
