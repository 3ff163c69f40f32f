use thiserror::Error;

/// Errors raised while loading or validating service configuration
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to read configuration file {path}: {details}")]
    FileError { path: String, details: String },

    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    #[error("Invalid configuration value for {field}: {details}")]
    InvalidValue { field: String, details: String },

    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },
}
