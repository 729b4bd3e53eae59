use std::path::PathBuf;
use thiserror::Error;

/// Main error type for mailtriage
#[derive(Error, Debug)]
pub enum TriageError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Input message could not be parsed into a MIME tree
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Intent classifier collaborator failed
    #[error("Classification error: {0}")]
    Classification(String),

    /// Entity extractor collaborator or pattern extraction failed
    #[error("Context extraction error: {0}")]
    Context(String),

    /// Record store connection, insert or commit failed
    #[error("Store error: {0}")]
    Store(String),

    /// Routing table invariant violated
    #[error("Routing error: {0}")]
    Routing(String),

    /// A collaborator call exceeded the configured bounded wait
    #[error("{stage} timed out after {millis}ms")]
    Timeout { stage: String, millis: u64 },

    /// Input directory could not be read (fatal for the whole batch)
    #[error("Cannot read input directory {path}: {source}")]
    InputDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for mailtriage operations
pub type Result<T> = std::result::Result<T, TriageError>;
