use std::collections::BTreeMap;

use serde_json::json;

use super::*;

const ENDPOINT: &str = "https://api.us-south.orchestrate.example.com/v1/agents/a1/chat";

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: BTreeMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_from_lookup_applies_defaults() {
    let config = BridgeConfig::from_lookup(lookup_from(&[
        (ENDPOINT_ENV, ENDPOINT),
        (API_KEY_ENV, "key-123"),
    ]))
    .expect("config should load");

    assert_eq!(config.endpoint, ENDPOINT);
    assert_eq!(config.credential.expose(), "key-123");
    assert_eq!(config.variant, PayloadVariant::SingleTurn);
    assert_eq!(config.timeout_ms, 30_000);
    assert_eq!(config.iam_token_url, DEFAULT_IAM_TOKEN_URL);
    assert!(config.additional_parameters.is_empty());
    assert!(config.context.is_empty());
}

#[test]
fn test_from_lookup_reads_optional_settings() {
    let config = BridgeConfig::from_lookup(lookup_from(&[
        (ENDPOINT_ENV, "http://localhost:8080/chat/"),
        (API_KEY_ENV, "key"),
        (VARIANT_ENV, "multi_turn"),
        (TIMEOUT_MS_ENV, " 2500 "),
        (IAM_TOKEN_URL_ENV, "http://localhost:9090/identity/token"),
    ]))
    .expect("config should load");

    assert_eq!(config.endpoint, "http://localhost:8080/chat");
    assert_eq!(config.variant, PayloadVariant::MultiTurn);
    assert_eq!(config.timeout_ms, 2_500);
    assert_eq!(config.iam_token_url, "http://localhost:9090/identity/token");
}

#[test]
fn test_missing_or_blank_api_key_is_configuration_error() {
    let missing = BridgeConfig::from_lookup(lookup_from(&[(ENDPOINT_ENV, ENDPOINT)]));
    assert_eq!(missing, Err(ConfigError::MissingApiKey));

    let blank = BridgeConfig::from_lookup(lookup_from(&[
        (ENDPOINT_ENV, ENDPOINT),
        (API_KEY_ENV, "   "),
    ]));
    assert_eq!(blank, Err(ConfigError::MissingApiKey));
}

#[test]
fn test_missing_endpoint_is_configuration_error() {
    let missing = BridgeConfig::from_lookup(lookup_from(&[(API_KEY_ENV, "key")]));
    assert_eq!(missing, Err(ConfigError::MissingEndpoint));
}

#[test]
fn test_invalid_values_are_rejected() {
    let bad_endpoint = BridgeConfig::new(
        Some("ftp://example.com".to_string()),
        Some("key".to_string()),
        PayloadVariant::SingleTurn,
    );
    assert!(matches!(
        bad_endpoint,
        Err(ConfigError::InvalidEndpoint { .. })
    ));

    let no_host = BridgeConfig::new(
        Some("https:///chat".to_string()),
        Some("key".to_string()),
        PayloadVariant::SingleTurn,
    );
    assert!(matches!(no_host, Err(ConfigError::InvalidEndpoint { .. })));

    let bad_variant = BridgeConfig::from_lookup(lookup_from(&[
        (ENDPOINT_ENV, ENDPOINT),
        (API_KEY_ENV, "key"),
        (VARIANT_ENV, "streaming"),
    ]));
    assert_eq!(
        bad_variant,
        Err(ConfigError::InvalidVariant {
            value: "streaming".to_string()
        })
    );

    for timeout in ["0", "soon", "-5"] {
        let bad_timeout = BridgeConfig::from_lookup(lookup_from(&[
            (ENDPOINT_ENV, ENDPOINT),
            (API_KEY_ENV, "key"),
            (TIMEOUT_MS_ENV, timeout),
        ]));
        assert_eq!(
            bad_timeout,
            Err(ConfigError::InvalidTimeout {
                value: timeout.to_string()
            })
        );
    }
}

#[test]
fn test_builder_setters() {
    let mut parameters = Map::new();
    parameters.insert("locale".to_string(), json!("en-US"));
    let mut context = Map::new();
    context.insert("user_id".to_string(), json!("u-1"));

    let config = BridgeConfig::new(
        Some(ENDPOINT.to_string()),
        Some("key".to_string()),
        PayloadVariant::SingleTurn,
    )
    .expect("config should build")
    .with_variant(PayloadVariant::MultiTurn)
    .with_additional_parameters(parameters.clone())
    .with_context(context.clone());

    assert_eq!(config.variant, PayloadVariant::MultiTurn);
    assert_eq!(config.additional_parameters, parameters);
    assert_eq!(config.context, context);

    assert!(config.clone().with_timeout_ms(0).is_err());
    assert!(config.with_iam_token_url("not a url").is_err());
}
