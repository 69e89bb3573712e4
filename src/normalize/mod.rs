use serde_json::Value;
use tracing::debug;

use crate::core::traits::ResponseExtractor;

pub const RAW_RESPONSE_PREFIX: &str = "Raw Response: ";

/// Reads `output.text`; a list of strings is joined with newlines.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutputTextExtractor;

impl ResponseExtractor for OutputTextExtractor {
    fn name(&self) -> &'static str {
        "output.text"
    }

    fn extract(&self, body: &Value) -> Option<String> {
        match body.get("output")?.get("text")? {
            Value::Null => None,
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(render_scalar)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            other => Some(render_scalar(other)),
        }
    }
}

/// Reads `choices[0].message.content`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChoiceMessageExtractor;

impl ResponseExtractor for ChoiceMessageExtractor {
    fn name(&self) -> &'static str {
        "choices[0].message.content"
    }

    fn extract(&self, body: &Value) -> Option<String> {
        match body.pointer("/choices/0/message/content")? {
            Value::Null => None,
            other => Some(render_scalar(other)),
        }
    }
}

pub struct ResponseNormalizer {
    extractors: Vec<Box<dyn ResponseExtractor>>,
}

impl ResponseNormalizer {
    pub fn new(extractors: Vec<Box<dyn ResponseExtractor>>) -> Self {
        Self { extractors }
    }

    pub fn with_extractor(mut self, extractor: impl ResponseExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors
            .iter()
            .map(|extractor| extractor.name())
            .collect()
    }

    pub fn normalize(&self, body: &Value) -> String {
        for extractor in &self.extractors {
            if let Some(text) = extractor.extract(body) {
                debug!(extractor = extractor.name(), "normalized agent response");
                return text;
            }
        }

        debug!("agent response shape not recognized; returning raw dump");
        raw_response_dump(body)
    }
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new(vec![
            Box::new(OutputTextExtractor),
            Box::new(ChoiceMessageExtractor),
        ])
    }
}

impl std::fmt::Debug for ResponseNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseNormalizer")
            .field("extractors", &self.extractor_names())
            .finish()
    }
}

pub fn normalize_response(body: &Value) -> String {
    ResponseNormalizer::default().normalize(body)
}

pub fn raw_response_dump(body: &Value) -> String {
    let rendered = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
    format!("{RAW_RESPONSE_PREFIX}{rendered}")
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
