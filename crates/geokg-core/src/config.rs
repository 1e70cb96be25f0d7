//! GeoKG Configuration Management
//!
//! Handles configuration from environment variables, config files,
//! and command-line arguments with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Entity and relationship extraction
    pub extraction: ExtractionConfig,

    /// Query engine
    pub query: QueryConfig,

    /// Build artifacts
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Extraction
        if let Some(value) = env_parse::<bool>("GEOKG_FOLD_DIACRITICS")? {
            self.extraction.fold_diacritics = value;
        }
        if let Some(value) = env_parse::<bool>("GEOKG_RELATION_PATTERNS")? {
            self.extraction.relation_patterns = value;
        }
        if let Some(value) = env_parse::<usize>(MAX_ENTITIES_ENV)? {
            if value < MIN_ENTITIES_PER_SENTENCE {
                return Err(ConfigError::InvalidValue {
                    key: MAX_ENTITIES_ENV.to_string(),
                    value: value.to_string(),
                });
            }
            self.extraction.max_entities_per_sentence = Some(value);
        }
        if let Ok(path) = std::env::var("GEOKG_TERMINOLOGY_FILE") {
            self.extraction.terminology_file = Some(PathBuf::from(path));
        }

        // Query
        if let Some(value) = env_parse::<usize>("GEOKG_MAX_NEIGHBORS")? {
            self.query.max_neighbors = value;
        }

        // Output
        if let Ok(dir) = std::env::var("GEOKG_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(value) = env_parse::<bool>("LOG_JSON")? {
            self.logging.json_format = value;
        }

        Ok(())
    }

    /// Reject settings that parse but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.extraction.max_entities_per_sentence {
            // A cap below two leaves no pairs, so no relations at all
            Some(cap) if cap < MIN_ENTITIES_PER_SENTENCE => Err(ConfigError::InvalidValue {
                key: "extraction.max_entities_per_sentence".to_string(),
                value: cap.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

const MAX_ENTITIES_ENV: &str = "GEOKG_MAX_ENTITIES_PER_SENTENCE";

/// Smallest per-sentence cap that still yields a pair
pub const MIN_ENTITIES_PER_SENTENCE: usize = 2;

/// Read and parse an environment variable, `None` when unset
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Match terms regardless of diacritics (OCR output often drops them)
    pub fold_diacritics: bool,

    /// Apply the directional relation patterns (part_of, contains, located_in)
    pub relation_patterns: bool,

    /// Cap on distinct entities considered per sentence in the relationship pass
    pub max_entities_per_sentence: Option<usize>,

    /// Custom terminology catalog (TOML); the built-in catalog when unset
    pub terminology_file: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            fold_diacritics: true,
            relation_patterns: true,
            max_entities_per_sentence: None,
            terminology_file: None,
        }
    }
}

/// Query engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Neighbors listed when describing an entity
    pub max_neighbors: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { max_neighbors: 10 }
    }
}

/// Build artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the snapshot, catalog and summary
    pub dir: PathBuf,

    /// Entities listed in the summary's "most connected" section
    pub top_connected: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("knowledge_graph"),
            top_connected: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
