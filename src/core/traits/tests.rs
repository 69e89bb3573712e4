use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::*;
use crate::core::error::BridgeError;
use crate::core::types::AccessToken;

struct MockTokenProvider {
    failure: Option<BridgeError>,
    calls: Arc<Mutex<u32>>,
}

impl MockTokenProvider {
    fn new(failure: Option<BridgeError>) -> Self {
        Self {
            failure,
            calls: Arc::new(Mutex::new(0)),
        }
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn bearer_token(&self) -> Result<AccessToken, BridgeError> {
        *self
            .calls
            .lock()
            .expect("calls lock should not be poisoned") += 1;

        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(AccessToken::new("mock-token")),
        }
    }
}

struct GreetingExtractor;

impl ResponseExtractor for GreetingExtractor {
    fn name(&self) -> &'static str {
        "greeting"
    }

    fn extract(&self, body: &Value) -> Option<String> {
        body.get("greeting")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

#[tokio::test]
async fn test_token_provider_object_safety() {
    let provider: Arc<dyn TokenProvider> = Arc::new(MockTokenProvider::new(None));
    let token = provider
        .bearer_token()
        .await
        .expect("mock token should succeed");
    assert_eq!(token.expose(), "mock-token");
}

#[tokio::test]
async fn test_token_provider_failure_contract() {
    let failure = BridgeError::authentication("identity service unavailable");
    let provider = MockTokenProvider::new(Some(failure.clone()));

    let first = provider
        .bearer_token()
        .await
        .expect_err("token should fail");
    assert_eq!(first, failure);

    let second = provider
        .bearer_token()
        .await
        .expect_err("token should fail again");
    assert_eq!(second, failure);

    let calls = *provider
        .calls
        .lock()
        .expect("calls lock should not be poisoned");
    assert_eq!(calls, 2);
}

#[test]
fn test_response_extractor_object_safety() {
    let extractors: Vec<Box<dyn ResponseExtractor>> = vec![Box::new(GreetingExtractor)];
    let extractor = extractors[0].as_ref();

    assert_eq!(extractor.name(), "greeting");
    assert_eq!(
        extractor.extract(&json!({"greeting": "hi"})),
        Some("hi".to_string())
    );
    assert_eq!(extractor.extract(&json!({"other": "hi"})), None);
}
