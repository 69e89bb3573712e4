use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{IamTokenExchange, StaticApiKey};
use crate::config::BridgeConfig;
use crate::core::error::{BridgeError, ConfigError};
use crate::core::traits::TokenProvider;
use crate::core::types::{Conversation, Message, PayloadVariant};
use crate::document::DocumentContext;
use crate::normalize::ResponseNormalizer;
use crate::payload::PayloadBuilder;
use crate::transport::http::HttpTransport;

pub struct AgentBridge {
    endpoint: String,
    transport: HttpTransport,
    token_provider: Arc<dyn TokenProvider>,
    payload_builder: PayloadBuilder,
    normalizer: ResponseNormalizer,
}

pub struct AgentBridgeBuilder {
    config: BridgeConfig,
    transport: Option<HttpTransport>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    normalizer: ResponseNormalizer,
}

impl AgentBridge {
    pub fn new(config: BridgeConfig) -> Result<Self, ConfigError> {
        Self::builder(config).build()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(BridgeConfig::from_env()?)
    }

    pub fn builder(config: BridgeConfig) -> AgentBridgeBuilder {
        AgentBridgeBuilder {
            config,
            transport: None,
            token_provider: None,
            normalizer: ResponseNormalizer::default(),
        }
    }

    pub fn variant(&self) -> PayloadVariant {
        self.payload_builder.variant()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Runs one turn and returns either the reply or the typed failure.
    pub async fn try_respond(
        &self,
        conversation: &Conversation,
        document: Option<&DocumentContext>,
    ) -> Result<String, BridgeError> {
        info!(
            variant = %self.variant(),
            history_len = conversation.len(),
            document_attached = document.is_some(),
            "starting agent turn"
        );

        let request = self.payload_builder.build(conversation, document)?;
        let token = self.token_provider.bearer_token().await?;

        let body = self
            .transport
            .post_json(&self.endpoint, Some(token.expose()), &request)
            .await?;

        Ok(self.normalizer.normalize(&body))
    }

    /// Runs one turn; every failure is rendered as the reply text.
    pub async fn respond(
        &self,
        conversation: &Conversation,
        document: Option<&DocumentContext>,
    ) -> String {
        match self.try_respond(conversation, document).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(kind = error.kind(), error = %error, "agent turn failed");
                error.to_string()
            }
        }
    }

    /// The stored user message never includes the document text.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        user_text: impl Into<String>,
        document: Option<&DocumentContext>,
    ) -> Message {
        conversation.push_user(user_text);
        let reply = Message::assistant(self.respond(conversation, document).await);
        conversation.push(reply.clone());
        reply
    }
}

impl AgentBridgeBuilder {
    pub fn with_transport(mut self, transport: HttpTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_token_provider(mut self, token_provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(token_provider);
        self
    }

    pub fn with_normalizer(mut self, normalizer: ResponseNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn build(self) -> Result<AgentBridge, ConfigError> {
        let config = self.config;

        let transport = match self.transport {
            Some(transport) => transport,
            None => HttpTransport::new(config.timeout_ms)?,
        };

        let token_provider = self
            .token_provider
            .unwrap_or_else(|| default_token_provider(&config, &transport));

        let payload_builder = PayloadBuilder::new(config.variant)
            .with_additional_parameters(config.additional_parameters)
            .with_context(config.context);

        Ok(AgentBridge {
            endpoint: config.endpoint,
            transport,
            token_provider,
            payload_builder,
            normalizer: self.normalizer,
        })
    }
}

fn default_token_provider(
    config: &BridgeConfig,
    transport: &HttpTransport,
) -> Arc<dyn TokenProvider> {
    if config.variant.requires_token_exchange() {
        Arc::new(IamTokenExchange::from_credential(
            transport.clone(),
            config.iam_token_url.clone(),
            &config.credential,
        ))
    } else {
        Arc::new(StaticApiKey::new(config.credential.clone()))
    }
}
