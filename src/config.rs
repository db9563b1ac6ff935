//! # Configuration Management
//!
//! Centralized configuration for the replication core.
//!
//! The core itself is synchronous and needs very little tuning; configuration covers
//! the wire codec limits, where component templates come from, and how logs are emitted.
//!
//! ## Configuration Sources
//! - TOML files via [`ReplicationConfig::from_file`]
//! - Direct instantiation with defaults
//! - Environment overrides (`REPLICATION_*`) via [`ReplicationConfig::from_env`]
//!
//! ## Example
//! ```toml
//! [codec]
//! default_format = "messagepack"
//! max_map_depth = 16
//! max_payload_size = 16777216
//!
//! [templates]
//! path = "components.json"
//! strict = false
//!
//! [logging]
//! app_name = "replication-core"
//! log_level = "info"
//! log_to_console = true
//! log_to_file = false
//! json_format = false
//! ```

use crate::core::packer::DEFAULT_MAX_MAP_DEPTH;
use crate::core::serialization::{MultiFormat, SerializationFormat};
use crate::error::{ReplicationError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Max allowed encoded payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Hard ceiling on configurable map nesting, kept below the decode nesting limit
pub const MAX_MAP_DEPTH_LIMIT: usize = 64;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ReplicationConfig {
    /// Wire codec limits and defaults
    #[serde(default)]
    pub codec: CodecConfig,

    /// Component template loading
    #[serde(default)]
    pub templates: TemplateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ReplicationConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| {
            ReplicationError::ConfigError(format!("Failed to open config file: {e}"))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            ReplicationError::ConfigError(format!("Failed to read config file: {e}"))
        })?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ReplicationError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(format) = std::env::var("REPLICATION_DEFAULT_FORMAT") {
            match format.to_ascii_lowercase().as_str() {
                "bincode" => config.codec.default_format = SerializationFormat::Bincode,
                "json" => config.codec.default_format = SerializationFormat::Json,
                "messagepack" => config.codec.default_format = SerializationFormat::MessagePack,
                _ => {}
            }
        }

        if let Ok(depth) = std::env::var("REPLICATION_MAX_MAP_DEPTH") {
            if let Ok(val) = depth.parse::<usize>() {
                config.codec.max_map_depth = val;
            }
        }

        if let Ok(size) = std::env::var("REPLICATION_MAX_PAYLOAD_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.codec.max_payload_size = val;
            }
        }

        if let Ok(path) = std::env::var("REPLICATION_TEMPLATE_PATH") {
            config.templates.path = Some(path);
        }

        if let Ok(strict) = std::env::var("REPLICATION_TEMPLATE_STRICT") {
            if let Ok(val) = strict.parse::<bool>() {
                config.templates.strict = val;
            }
        }

        if let Ok(level) = std::env::var("REPLICATION_LOG_LEVEL") {
            if let Ok(val) = level.parse::<Level>() {
                config.logging.log_level = val;
            }
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            ReplicationError::ConfigError(format!("Failed to serialize config: {e}"))
        })?;

        std::fs::write(path, content).map_err(|e| {
            ReplicationError::ConfigError(format!("Failed to write config file: {e}"))
        })?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.codec.validate());
        errors.extend(self.templates.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ReplicationError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Wire codec configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Byte encoding used when none is requested explicitly
    pub default_format: SerializationFormat,

    /// Deepest string-map nesting accepted on unpack
    pub max_map_depth: usize,

    /// Largest encoded payload accepted on decode
    pub max_payload_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            default_format: SerializationFormat::default(),
            max_map_depth: DEFAULT_MAX_MAP_DEPTH,
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }
}

impl CodecConfig {
    /// Encode `value` with [`default_format`](Self::default_format), prefixed by
    /// its format byte.
    pub fn encode<T: MultiFormat>(&self, value: &T) -> Result<Vec<u8>> {
        value.serialize_with_header(self.default_format)
    }

    /// Decode a format-prefixed payload, refusing anything above
    /// [`max_payload_size`](Self::max_payload_size).
    pub fn decode<T: MultiFormat>(&self, data: &[u8]) -> Result<T> {
        let (value, _) = T::deserialize_bounded(data, self.max_payload_size)?;
        Ok(value)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_map_depth == 0 {
            errors.push("max_map_depth must be at least 1".to_string());
        } else if self.max_map_depth > MAX_MAP_DEPTH_LIMIT {
            errors.push(format!(
                "max_map_depth too large: {} (maximum: {MAX_MAP_DEPTH_LIMIT})",
                self.max_map_depth
            ));
        }

        if self.max_payload_size == 0 {
            errors.push("max_payload_size cannot be zero".to_string());
        } else if self.max_payload_size > MAX_PAYLOAD_SIZE {
            errors.push(format!(
                "max_payload_size too large: {} bytes (maximum: {MAX_PAYLOAD_SIZE})",
                self.max_payload_size
            ));
        }

        errors
    }
}

/// Component template loading
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TemplateConfig {
    /// JSON template document to load at startup
    pub path: Option<String>,

    /// Fail on malformed template entries instead of skipping them
    pub strict: bool,
}

impl TemplateConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(ref path) = self.path {
            if path.is_empty() {
                errors.push("Template path cannot be empty".to_string());
            } else if !Path::new(path).exists() {
                errors.push(format!("Template file does not exist: {path}"));
            }
        }
        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("replication-core"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
