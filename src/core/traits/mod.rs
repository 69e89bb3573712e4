use async_trait::async_trait;
use serde_json::Value;

use crate::core::error::BridgeError;
use crate::core::types::AccessToken;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<AccessToken, BridgeError>;
}

/// Tried in order by the normalizer; the first `Some` wins.
pub trait ResponseExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, body: &Value) -> Option<String>;
}

#[cfg(test)]
mod tests;
