use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::core::error::{ConfigError, TransportError};

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const REQUEST_ID_HEADER: &str = "x-request-id";
const GLOBAL_TRANSACTION_ID_HEADER: &str = "x-global-transaction-id";

/// Single attempt per request, bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl HttpTransport {
    pub fn new(timeout_ms: u64) -> Result<Self, ConfigError> {
        Self::with_client(reqwest::Client::new(), timeout_ms)
    }

    pub fn with_client(client: reqwest::Client, timeout_ms: u64) -> Result<Self, ConfigError> {
        Self::validate_timeout(timeout_ms)?;
        Ok(Self { client, timeout_ms })
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub async fn post_json<TReq>(
        &self,
        url: &str,
        bearer_token: Option<&str>,
        body: &TReq,
    ) -> Result<Value, TransportError>
    where
        TReq: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body).map_err(|error| TransportError::Serialization {
            message: error.to_string(),
        })?;

        let mut request_builder = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .body(payload);

        if let Some(token) = bearer_token {
            let auth_value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|error| {
                TransportError::Serialization {
                    message: format!("invalid bearer token header value: {error}"),
                }
            })?;
            request_builder = request_builder.header(AUTHORIZATION, auth_value);
        }

        self.execute(url, request_builder).await
    }

    pub async fn post_form<TForm>(&self, url: &str, form: &TForm) -> Result<Value, TransportError>
    where
        TForm: Serialize + ?Sized,
    {
        let request_builder = self
            .client
            .post(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .form(form);

        self.execute(url, request_builder).await
    }

    async fn execute(
        &self,
        url: &str,
        request_builder: RequestBuilder,
    ) -> Result<Value, TransportError> {
        debug!(url, timeout_ms = self.timeout_ms, "sending request");

        let response = request_builder
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await
            .map_err(|error| self.transport_error(&error))?;

        let status_code = response.status().as_u16();
        let request_id = extract_request_id(response.headers());
        debug!(url, status_code, request_id = ?request_id, "received response");

        if !response.status().is_success() {
            return Err(build_status_error(status_code, request_id, response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|error| self.transport_error(&error))?;

        serde_json::from_str::<Value>(&text).map_err(|error| TransportError::Decode {
            request_id,
            message: error.to_string(),
        })
    }

    fn transport_error(&self, error: &reqwest::Error) -> TransportError {
        TransportError::Transport {
            message: error.to_string(),
            timed_out: error.is_timeout(),
            timeout_ms: self.timeout_ms,
        }
    }

    fn validate_timeout(timeout_ms: u64) -> Result<(), ConfigError> {
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout {
                value: timeout_ms.to_string(),
            });
        }
        Ok(())
    }
}

async fn build_status_error(
    status_code: u16,
    request_id: Option<String>,
    response: Response,
) -> TransportError {
    let body = match response.text().await {
        Ok(body) => body,
        Err(error) => format!("failed to read response body: {error}"),
    };

    TransportError::Status {
        status_code,
        request_id,
        body,
    }
}

fn extract_request_id(headers: &HeaderMap) -> Option<String> {
    [REQUEST_ID_HEADER, GLOBAL_TRANSACTION_ID_HEADER]
        .into_iter()
        .map(HeaderName::from_static)
        .find_map(|name| {
            headers
                .get(&name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
}
