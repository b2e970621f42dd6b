//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating an `isag.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// An `ISAG_*` environment variable holds a value that cannot be parsed.
    #[error("invalid value '{value}' for environment variable {var}")]
    InvalidEnv {
        /// The variable name.
        var: String,
        /// The rejected value.
        value: String,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
