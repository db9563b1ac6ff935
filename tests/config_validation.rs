//! Integration tests for configuration validation

#![allow(clippy::expect_used)]

use replication_core::config::{
    CodecConfig, LoggingConfig, ReplicationConfig, TemplateConfig, MAX_MAP_DEPTH_LIMIT,
    MAX_PAYLOAD_SIZE,
};
use replication_core::core::nesting::MAX_DECODE_DEPTH;
use replication_core::core::serialization::{MultiFormat, SerializationFormat};
use replication_core::core::wire_value::WireValue;
use replication_core::error::ReplicationError;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = ReplicationConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_zero_map_depth() {
    let config = ReplicationConfig::default_with_overrides(|c| c.codec.max_map_depth = 0);
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("max_map_depth")));
}

#[test]
fn test_excessive_map_depth() {
    let codec = CodecConfig {
        max_map_depth: 10_000,
        ..CodecConfig::default()
    };
    assert!(codec.validate().iter().any(|e| e.contains("too large")));

    let at_limit = CodecConfig {
        max_map_depth: MAX_MAP_DEPTH_LIMIT,
        ..CodecConfig::default()
    };
    assert!(at_limit.validate().is_empty());
    assert!(at_limit.max_map_depth < MAX_DECODE_DEPTH);
}

#[test]
fn test_payload_size_bounds() {
    let mut codec = CodecConfig::default();
    codec.max_payload_size = 0;
    assert!(codec.validate().iter().any(|e| e.contains("cannot be zero")));

    codec.max_payload_size = MAX_PAYLOAD_SIZE + 1;
    assert!(codec.validate().iter().any(|e| e.contains("too large")));
}

#[test]
fn test_missing_template_file() {
    let templates = TemplateConfig {
        path: Some("/nonexistent/components.json".to_string()),
        strict: true,
    };
    let errors = templates.validate();
    assert!(errors.iter().any(|e| e.contains("does not exist")));
}

#[test]
fn test_logging_requires_an_output() {
    let logging = LoggingConfig {
        log_to_console: false,
        log_to_file: false,
        ..LoggingConfig::default()
    };
    assert!(logging
        .validate()
        .iter()
        .any(|e| e.contains("At least one logging output")));
}

#[test]
fn test_file_logging_requires_path() {
    let logging = LoggingConfig {
        log_to_file: true,
        log_file_path: None,
        ..LoggingConfig::default()
    };
    assert!(logging
        .validate()
        .iter()
        .any(|e| e.contains("log_file_path must be specified")));
}

#[test]
fn test_empty_app_name() {
    let logging = LoggingConfig {
        app_name: String::new(),
        ..LoggingConfig::default()
    };
    assert!(logging.validate().iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_validate_strict_collects_errors() {
    let config = ReplicationConfig::default_with_overrides(|c| {
        c.codec.max_map_depth = 0;
        c.logging.app_name = String::new();
    });
    let err = config.validate_strict().expect_err("invalid config");
    let message = err.to_string();
    assert!(message.contains("max_map_depth"));
    assert!(message.contains("Application name"));
}

#[test]
fn test_toml_parsing() {
    let config = ReplicationConfig::from_toml(
        r#"
        [codec]
        default_format = "messagepack"
        max_map_depth = 8

        [templates]
        strict = true

        [logging]
        app_name = "client"
        log_level = "debug"
        log_to_console = true
        log_to_file = false
        json_format = true
        "#,
    )
    .expect("valid toml");

    assert_eq!(config.codec.default_format, SerializationFormat::MessagePack);
    assert_eq!(config.codec.max_map_depth, 8);
    assert_eq!(config.codec.max_payload_size, MAX_PAYLOAD_SIZE);
    assert!(config.templates.strict);
    assert_eq!(config.logging.log_level, Level::DEBUG);
    assert!(config.logging.json_format);
}

#[test]
fn test_invalid_toml_is_config_error() {
    assert!(ReplicationConfig::from_toml("[codec]\nmax_map_depth = \"deep\"").is_err());
    assert!(ReplicationConfig::from_toml("[logging]\nlog_level = \"loud\"\napp_name = \"x\"\nlog_to_console = true\nlog_to_file = false\njson_format = false").is_err());
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("replication.toml");

    let config = ReplicationConfig::default_with_overrides(|c| {
        c.codec.default_format = SerializationFormat::Json;
        c.templates.strict = true;
    });
    config.save_to_file(&path).expect("save");

    let reloaded = ReplicationConfig::from_file(&path).expect("reload");
    assert_eq!(reloaded.codec.default_format, SerializationFormat::Json);
    assert!(reloaded.templates.strict);
}

#[test]
fn test_example_config_parses() {
    let example = ReplicationConfig::example_config();
    assert!(ReplicationConfig::from_toml(&example).is_ok());
}

#[test]
fn test_codec_config_encodes_with_default_format() {
    let codec = CodecConfig {
        default_format: SerializationFormat::MessagePack,
        ..CodecConfig::default()
    };
    let tree = WireValue::Array(vec![WireValue::Int64(7), WireValue::String("door".to_string())]);

    let bytes = codec.encode(&tree).expect("encode");
    assert_eq!(bytes[0], SerializationFormat::MessagePack.format_byte());
    assert_eq!(codec.decode::<WireValue>(&bytes).expect("decode"), tree);

    let (_, detected) = WireValue::deserialize_with_header(&bytes).expect("header");
    assert_eq!(detected, SerializationFormat::MessagePack);
}

#[test]
fn test_codec_config_refuses_oversized_payloads() {
    let tree = WireValue::String("x".repeat(64));
    let bytes = CodecConfig::default().encode(&tree).expect("encode");

    let tight = CodecConfig {
        max_payload_size: bytes.len() - 1,
        ..CodecConfig::default()
    };
    assert!(matches!(
        tight.decode::<WireValue>(&bytes),
        Err(ReplicationError::DeserializeError(_))
    ));
}
