use serde_json::{Map, Value};

use crate::core::error::ConfigError;
use crate::core::types::{Credential, PayloadVariant};
use crate::transport::http::DEFAULT_TIMEOUT_MS;

pub const API_KEY_ENV: &str = "WATSONX_API_KEY";
pub const ENDPOINT_ENV: &str = "WATSONX_ORCHESTRATE_ENDPOINT";
pub const VARIANT_ENV: &str = "WATSONX_ORCHESTRATE_VARIANT";
pub const TIMEOUT_MS_ENV: &str = "WATSONX_ORCHESTRATE_TIMEOUT_MS";
pub const IAM_TOKEN_URL_ENV: &str = "WATSONX_IAM_TOKEN_URL";

pub const DEFAULT_IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub endpoint: String,
    pub credential: Credential,
    pub variant: PayloadVariant,
    pub timeout_ms: u64,
    pub iam_token_url: String,
    pub additional_parameters: Map<String, Value>,
    pub context: Map<String, Value>,
}

impl BridgeConfig {
    pub fn new(
        endpoint: Option<String>,
        api_key: Option<String>,
        variant: PayloadVariant,
    ) -> Result<Self, ConfigError> {
        let credential = Credential::new(api_key).ok_or(ConfigError::MissingApiKey)?;
        let endpoint = sanitize(endpoint).ok_or(ConfigError::MissingEndpoint)?;
        validate_url(&endpoint)?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credential,
            variant,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            iam_token_url: DEFAULT_IAM_TOKEN_URL.to_string(),
            additional_parameters: Map::new(),
            context: Map::new(),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let variant = match sanitize(lookup(VARIANT_ENV)) {
            Some(value) => {
                PayloadVariant::parse(&value).ok_or(ConfigError::InvalidVariant { value })?
            }
            None => PayloadVariant::default(),
        };

        let mut config = Self::new(lookup(ENDPOINT_ENV), lookup(API_KEY_ENV), variant)?;

        if let Some(value) = sanitize(lookup(TIMEOUT_MS_ENV)) {
            config = config.with_timeout_ms(parse_timeout(&value)?)?;
        }
        if let Some(url) = sanitize(lookup(IAM_TOKEN_URL_ENV)) {
            config = config.with_iam_token_url(url)?;
        }

        Ok(config)
    }

    pub fn with_variant(mut self, variant: PayloadVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Result<Self, ConfigError> {
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout {
                value: timeout_ms.to_string(),
            });
        }
        self.timeout_ms = timeout_ms;
        Ok(self)
    }

    pub fn with_iam_token_url(mut self, url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().to_string();
        validate_url(&url)?;
        self.iam_token_url = url;
        Ok(self)
    }

    pub fn with_additional_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.additional_parameters = parameters;
        self
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }
}

fn sanitize(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_timeout(value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(timeout_ms) if timeout_ms > 0 => Ok(timeout_ms),
        _ => Err(ConfigError::InvalidTimeout {
            value: value.to_string(),
        }),
    }
}

fn validate_url(url: &str) -> Result<(), ConfigError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| ConfigError::InvalidEndpoint {
            endpoint: url.to_string(),
            reason: "expected an http or https URL".to_string(),
        })?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(ConfigError::InvalidEndpoint {
            endpoint: url.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests;
