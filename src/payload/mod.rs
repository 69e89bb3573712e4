use serde_json::{Map, Value};
use tracing::debug;

use crate::core::error::BridgeError;
use crate::core::types::{
    AgentRequest, Conversation, InputMessageType, Message, MultiTurnRequest, PayloadVariant,
    SingleTurnRequest, TextInput,
};
use crate::document::DocumentContext;

pub const DOCUMENT_HEADER: &str = "Context from uploaded file:\n\n";
pub const QUESTION_SEPARATOR: &str = "\n\nUser Question:\n";

/// Prefixes a user question with the full text of an attached document.
pub fn compose_document_prompt(document: &str, question: &str) -> String {
    let mut prompt = String::with_capacity(
        DOCUMENT_HEADER.len() + document.len() + QUESTION_SEPARATOR.len() + question.len(),
    );
    prompt.push_str(DOCUMENT_HEADER);
    prompt.push_str(document);
    prompt.push_str(QUESTION_SEPARATOR);
    prompt.push_str(question);
    prompt
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadBuilder {
    variant: PayloadVariant,
    additional_parameters: Map<String, Value>,
    context: Map<String, Value>,
}

impl PayloadBuilder {
    pub fn new(variant: PayloadVariant) -> Self {
        Self {
            variant,
            additional_parameters: Map::new(),
            context: Map::new(),
        }
    }

    pub fn with_additional_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.additional_parameters = parameters;
        self
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn variant(&self) -> PayloadVariant {
        self.variant
    }

    pub fn build(
        &self,
        conversation: &Conversation,
        document: Option<&DocumentContext>,
    ) -> Result<AgentRequest, BridgeError> {
        let request = match self.variant {
            PayloadVariant::SingleTurn => self.build_single_turn(conversation, document)?,
            PayloadVariant::MultiTurn => self.build_multi_turn(conversation, document),
        };

        debug!(
            variant = %self.variant,
            history_len = conversation.len(),
            document_attached = document.is_some(),
            "built agent request"
        );

        Ok(request)
    }

    fn build_single_turn(
        &self,
        conversation: &Conversation,
        document: Option<&DocumentContext>,
    ) -> Result<AgentRequest, BridgeError> {
        let (_, latest) = conversation
            .latest_user_message()
            .ok_or(BridgeError::EmptyConversation)?;

        Ok(AgentRequest::SingleTurn(SingleTurnRequest {
            input: TextInput {
                message_type: InputMessageType::Text,
                text: outbound_content(&latest.content, document),
            },
        }))
    }

    fn build_multi_turn(
        &self,
        conversation: &Conversation,
        document: Option<&DocumentContext>,
    ) -> AgentRequest {
        let latest_user_index = conversation.latest_user_message().map(|(index, _)| index);

        let messages = conversation
            .messages()
            .iter()
            .enumerate()
            .map(|(index, message)| {
                if Some(index) == latest_user_index {
                    Message {
                        role: message.role,
                        content: outbound_content(&message.content, document),
                    }
                } else {
                    message.clone()
                }
            })
            .collect();

        AgentRequest::MultiTurn(MultiTurnRequest {
            messages,
            additional_parameters: self.additional_parameters.clone(),
            context: self.context.clone(),
            stream: false,
        })
    }
}

fn outbound_content(question: &str, document: Option<&DocumentContext>) -> String {
    match document {
        Some(document) if !document.is_empty() => {
            compose_document_prompt(document.text(), question)
        }
        _ => question.to_string(),
    }
}
