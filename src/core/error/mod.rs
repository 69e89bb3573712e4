use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("missing agent endpoint")]
    MissingEndpoint,
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("invalid timeout: {value}")]
    InvalidTimeout { value: String },
    #[error("invalid payload variant: {value} (expected single_turn or multi_turn)")]
    InvalidVariant { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error(
        "{message}{context}",
        context = format_timeout(*.timed_out, *.timeout_ms)
    )]
    Transport {
        message: String,
        timed_out: bool,
        timeout_ms: u64,
    },
    #[error(
        "http status {status_code}{context}: {body}",
        context = format_request_id(.request_id.as_deref())
    )]
    Status {
        status_code: u16,
        request_id: Option<String>,
        body: String,
    },
    #[error("request encoding failed: {message}")]
    Serialization { message: String },
    #[error(
        "response body is not valid JSON{context}: {message}",
        context = format_request_id(.request_id.as_deref())
    )]
    Decode {
        request_id: Option<String>,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("document is not valid UTF-8: {message}")]
    Utf8 { message: String },
    #[error("document is not valid JSON: {message}")]
    Json { message: String },
    #[error("malformed delimited data at line {line}: {message}")]
    Delimited { line: usize, message: String },
    #[error("unsupported document type: {extension}")]
    Unsupported { extension: String },
}

/// `Display` is the text shown to the user in place of a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error(
        "Error: Configuration {state}. Please check API Key and Endpoint. ({0})",
        state = configuration_state(.0)
    )]
    Configuration(#[from] ConfigError),
    #[error("Error: Could not generate access token. Authentication Failed: {message}")]
    Authentication { message: String },
    #[error("Connection Error: {message}")]
    Transport { message: String },
    #[error("Error {status_code}: {body}")]
    Provider { status_code: u16, body: String },
    #[error("Error: agent response could not be decoded: {message}")]
    Parse { message: String },
    #[error("Error: conversation has no user message to send.")]
    EmptyConversation,
}

impl BridgeError {
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Authentication { .. } => "authentication",
            Self::Transport { .. } => "transport",
            Self::Provider { .. } => "provider",
            Self::Parse { .. } => "parse",
            Self::EmptyConversation => "empty_conversation",
        }
    }
}

impl From<TransportError> for BridgeError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Transport { .. } => Self::Transport {
                message: error.to_string(),
            },
            TransportError::Status {
                status_code, body, ..
            } => Self::Provider { status_code, body },
            TransportError::Serialization { .. } | TransportError::Decode { .. } => Self::Parse {
                message: error.to_string(),
            },
        }
    }
}

fn configuration_state(error: &ConfigError) -> &'static str {
    match error {
        ConfigError::MissingApiKey | ConfigError::MissingEndpoint => "missing",
        _ => "invalid",
    }
}

fn format_timeout(timed_out: bool, timeout_ms: u64) -> String {
    if timed_out {
        format!(" (timed out after {timeout_ms} ms)")
    } else {
        String::new()
    }
}

fn format_request_id(request_id: Option<&str>) -> String {
    match request_id {
        Some(request_id) => format!(" [request_id={request_id}]"),
        None => String::new(),
    }
}
