use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::error::{BridgeError, ConfigError};
use crate::core::traits::TokenProvider;
use crate::core::types::{AccessToken, Credential};
use crate::transport::http::HttpTransport;

pub const API_KEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Exchanges an API key for an IAM bearer token on every call.
#[derive(Debug, Clone)]
pub struct IamTokenExchange {
    transport: HttpTransport,
    token_url: String,
    credential: Option<Credential>,
}

impl IamTokenExchange {
    pub fn new(
        transport: HttpTransport,
        token_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            token_url: token_url.into(),
            credential: Credential::new(Some(api_key.into())),
        }
    }

    pub fn from_credential(
        transport: HttpTransport,
        token_url: impl Into<String>,
        credential: &Credential,
    ) -> Self {
        Self {
            transport,
            token_url: token_url.into(),
            credential: Some(credential.clone()),
        }
    }

    pub async fn exchange(&self) -> Result<AccessToken, BridgeError> {
        let Some(credential) = &self.credential else {
            return Err(ConfigError::MissingApiKey.into());
        };
        let api_key = credential.expose();

        debug!(token_url = %self.token_url, "exchanging api key for access token");

        let body = self
            .transport
            .post_form(
                &self.token_url,
                &[("grant_type", API_KEY_GRANT_TYPE), ("apikey", api_key)],
            )
            .await
            .map_err(|error| {
                warn!(error = %error, "token exchange failed");
                BridgeError::authentication(error.to_string())
            })?;

        extract_access_token(&body)
    }
}

#[async_trait]
impl TokenProvider for IamTokenExchange {
    async fn bearer_token(&self) -> Result<AccessToken, BridgeError> {
        self.exchange().await
    }
}

#[derive(Debug, Clone)]
pub struct StaticApiKey {
    credential: Credential,
}

impl StaticApiKey {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl TokenProvider for StaticApiKey {
    async fn bearer_token(&self) -> Result<AccessToken, BridgeError> {
        Ok(AccessToken::new(self.credential.expose()))
    }
}

fn extract_access_token(body: &Value) -> Result<AccessToken, BridgeError> {
    match body.get("access_token").and_then(Value::as_str) {
        Some(token) if !token.trim().is_empty() => Ok(AccessToken::new(token)),
        Some(_) => Err(BridgeError::authentication(
            "token response contained an empty access_token",
        )),
        None => Err(BridgeError::authentication(
            "token response missing access_token",
        )),
    }
}
